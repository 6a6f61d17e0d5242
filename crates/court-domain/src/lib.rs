//! Court Domain Layer
//!
//! This crate contains the entities and rules of the court application.
//! Apart from `uuid` it has no external dependencies and defines the value
//! objects and trait interfaces that all other layers depend upon.
//!
//! ## Key Concepts
//!
//! - **User**: an account with a [`Role`] (defendant, plaintiff, juror, judge)
//! - **Case**: a submitted dispute moving through pending → approved/rejected
//! - **Vote**: a juror's [`Verdict`], at most one per juror per case
//! - **Principal**: the verified identity threaded into every operation
//!
//! ## Architecture
//!
//! - Pure data and validation only
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod case;
pub mod error;
pub mod ids;
pub mod principal;
pub mod role;
pub mod traits;
pub mod user;
pub mod vote;

// Re-exports for convenience
pub use case::{BlobRef, Case, CasePatch, CaseStatus, CaseUpdateError, NewCase};
pub use error::ValidationError;
pub use ids::{CaseId, UserId, VoteId};
pub use principal::Principal;
pub use role::Role;
pub use user::User;
pub use vote::{Tally, Verdict, Vote};

/// Current time as Unix seconds
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
