//! Role module - what a user account is allowed to do

use crate::ValidationError;

/// Role carried by every user account
///
/// - Defendant / Plaintiff: submit cases
/// - Juror: vote on approved cases
/// - Judge: approve, reject, edit and delete cases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    /// Party defending a case (the signup default)
    #[default]
    Defendant,

    /// Party bringing a case
    Plaintiff,

    /// Casts verdicts on approved cases
    Juror,

    /// Reviews submitted cases
    Judge,
}

impl Role {
    /// Every role, in declaration order
    pub const ALL: [Role; 4] = [Role::Defendant, Role::Plaintiff, Role::Juror, Role::Judge];

    /// Get the role name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Defendant => "defendant",
            Role::Plaintiff => "plaintiff",
            Role::Juror => "juror",
            Role::Judge => "judge",
        }
    }

    /// Parse a role from a string, ignoring case
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "defendant" => Some(Role::Defendant),
            "plaintiff" => Some(Role::Plaintiff),
            "juror" => Some(Role::Juror),
            "judge" => Some(Role::Judge),
            _ => None,
        }
    }

    /// Whether this role may submit cases
    pub fn is_party(&self) -> bool {
        matches!(self, Role::Defendant | Role::Plaintiff)
    }

    /// Whether a user may switch themselves into this role after signup
    ///
    /// Only juror and judge are self-service targets.
    pub fn can_switch_to_self_service(&self) -> bool {
        matches!(self, Role::Juror | Role::Judge)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ValidationError::new(format!("Invalid role: {}", s)))
    }
}
