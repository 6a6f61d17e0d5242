//! User accounts

use crate::{Role, UserId, ValidationError};

/// Longest username accepted, in characters
pub const MAX_USERNAME_CHARS: usize = 150;

/// A registered account
///
/// The password credential is an opaque string owned by the authentication
/// collaborator; the domain never interprets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique identifier
    pub id: UserId,

    /// Unique login name
    pub username: String,

    /// Contact address, possibly empty
    pub email: String,

    /// Opaque password credential
    pub password_hash: String,

    /// Current role
    pub role: Role,

    /// When the account was created (Unix seconds)
    pub created_at: u64,
}

impl User {
    /// Validate signup fields and build the account
    pub fn register(
        username: &str,
        email: &str,
        password_hash: String,
        role: Role,
        created_at: u64,
    ) -> Result<Self, ValidationError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ValidationError::new("username is required"));
        }
        if username.chars().count() > MAX_USERNAME_CHARS {
            return Err(ValidationError::new(format!(
                "username must be at most {} characters",
                MAX_USERNAME_CHARS
            )));
        }
        if username.chars().any(char::is_whitespace) {
            return Err(ValidationError::new("username must not contain whitespace"));
        }

        let email = email.trim();
        if !email.is_empty() && !email.contains('@') {
            return Err(ValidationError::new("email address is malformed"));
        }

        Ok(Self {
            id: UserId::new(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            role,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_trims_and_keeps_role() {
        let user = User::register(" alice ", "alice@example.com", "hash".into(), Role::Juror, 5)
            .unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.role, Role::Juror);
    }

    #[test]
    fn test_register_rejects_bad_fields() {
        assert!(User::register("", "", "h".into(), Role::Judge, 0).is_err());
        assert!(User::register("a b", "", "h".into(), Role::Judge, 0).is_err());
        assert!(User::register("bob", "not-an-email", "h".into(), Role::Judge, 0).is_err());
        assert!(User::register("bob", "", "h".into(), Role::Judge, 0).is_ok());
    }
}
