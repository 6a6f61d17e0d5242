//! Court Case Service
//!
//! Role-gated operations on cases and votes.
//!
//! The service provides:
//! - Case submission, review (approve/reject), editing and deletion
//! - One vote per juror per approved case
//! - Self-service role switching
//! - An explicit authorization policy consulted before every operation
//!
//! # Examples
//!
//! ```no_run
//! use court_domain::{NewCase, Principal, Role, UserId};
//! use court_service::CaseService;
//! use court_store::{MemoryBlobStore, SqliteStore};
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! let mut service = CaseService::new(store, MemoryBlobStore::new());
//!
//! let plaintiff = Principal::new(UserId::new(), Role::Plaintiff);
//! let new_case = NewCase {
//!     title: "Fence dispute".to_string(),
//!     argument: "The fence is on my land".to_string(),
//!     evidence: None,
//! };
//! let case = service.submit_case(&plaintiff, new_case, None);
//! assert!(case.is_err(), "the plaintiff was never registered");
//! ```

#![warn(missing_docs)]

mod config;
mod error;
pub mod policy;
mod service;

pub use config::{ServiceConfig, DEFAULT_MAX_EVIDENCE_BYTES};
pub use error::{ErrorKind, ServiceError};
pub use service::{
    CaseEdit, CaseOverview, CaseService, EvidenceFile, EvidenceUpload, ServiceResult, VoteSummary,
};
