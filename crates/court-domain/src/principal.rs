//! The verified identity behind a request

use crate::{Role, User, UserId};

/// Authenticated identity plus role making a request
///
/// Supplied by the authentication collaborator and threaded explicitly into
/// every service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    /// Who is acting
    pub user_id: UserId,

    /// Their role at the time of the request
    pub role: Role,
}

impl Principal {
    /// Create a principal
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.role)
    }
}
