//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{BlobRef, Case, CaseId, CaseStatus, Role, User, UserId, Vote};

/// Outcome of inserting a user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInsert {
    /// The account was stored
    Inserted,

    /// Another account already uses the username
    UsernameTaken,
}

/// Outcome of inserting a vote
///
/// Constraint outcomes are reported here rather than as errors: the store,
/// not a prior read, decides whether a vote may be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteInsert {
    /// The vote was stored
    Inserted,

    /// The juror already has a vote on this case
    AlreadyVoted,

    /// The case was missing or not approved at insert time
    CaseUnavailable,
}

/// Trait for storing and retrieving users, cases and votes
///
/// Implemented by the infrastructure layer (court-store)
pub trait CourtStore {
    /// Error type for store operations
    type Error;

    /// Store a new user, enforcing username uniqueness
    fn insert_user(&mut self, user: &User) -> Result<UserInsert, Self::Error>;

    /// Get a user by ID
    fn get_user(&self, id: UserId) -> Result<Option<User>, Self::Error>;

    /// Get a user by username
    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, Self::Error>;

    /// Change a user's role; returns false if the user does not exist
    fn set_role(&mut self, id: UserId, role: Role) -> Result<bool, Self::Error>;

    /// Store a new case
    fn insert_case(&mut self, case: &Case) -> Result<(), Self::Error>;

    /// Get a case by ID
    fn get_case(&self, id: CaseId) -> Result<Option<Case>, Self::Error>;

    /// Overwrite a stored case; returns false if the case does not exist
    fn update_case(&mut self, case: &Case) -> Result<bool, Self::Error>;

    /// Delete a case together with its votes, atomically
    ///
    /// Returns false if the case did not exist.
    fn delete_case(&mut self, id: CaseId) -> Result<bool, Self::Error>;

    /// Query cases matching criteria, oldest first
    fn query_cases(&self, query: &CaseQuery) -> Result<Vec<Case>, Self::Error>;

    /// Store a vote if the case is approved and the juror has not voted
    fn insert_vote(&mut self, vote: &Vote) -> Result<VoteInsert, Self::Error>;

    /// Get the vote a juror cast on a case
    fn find_vote(&self, case_id: CaseId, juror: UserId) -> Result<Option<Vote>, Self::Error>;

    /// All votes cast on a case, oldest first
    fn list_votes(&self, case_id: CaseId) -> Result<Vec<Vote>, Self::Error>;
}

/// Query criteria for retrieving cases
#[derive(Debug, Clone, Default)]
pub struct CaseQuery {
    /// Filter by status
    pub status: Option<CaseStatus>,

    /// Filter by submitter
    pub submitted_by: Option<UserId>,

    /// Maximum results to return
    pub limit: Option<usize>,
}

impl CaseQuery {
    /// Cases with the given status
    pub fn with_status(status: CaseStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// Trait for storing uploaded evidence files
///
/// Implemented by the infrastructure layer (court-store)
pub trait BlobStore {
    /// Error type for blob operations
    type Error;

    /// Store `bytes` under a handle derived from `name`
    fn put(&self, name: &str, bytes: &[u8]) -> Result<BlobRef, Self::Error>;

    /// Fetch the bytes behind a handle
    fn get(&self, blob: &BlobRef) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Remove the bytes behind a handle; returns false if nothing was stored
    fn delete(&self, blob: &BlobRef) -> Result<bool, Self::Error>;
}
