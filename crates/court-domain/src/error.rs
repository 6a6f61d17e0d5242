//! Validation failures raised by domain constructors

use std::fmt;

/// A field failed construction-time validation
///
/// ## Invariants
/// - `message` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    /// Create a validation error with a human-readable message
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            "validation failed".to_string()
        } else {
            message
        };
        Self { message }
    }

    /// Human-readable description of the failure
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}
