//! Case module - a submitted dispute and its review workflow

use crate::{CaseId, UserId, ValidationError};
use std::fmt;

/// Longest title accepted for a case, in characters
pub const MAX_TITLE_CHARS: usize = 200;

/// Review status of a case
///
/// ```text
/// pending --approve--> approved
/// pending --reject---> rejected
/// ```
///
/// Approved and rejected are terminal. Re-applying the current status is
/// accepted as a no-op so repeated approvals stay harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CaseStatus {
    /// Awaiting a judge
    #[default]
    Pending,

    /// Open for juror votes
    Approved,

    /// Turned down by a judge
    Rejected,
}

impl CaseStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Pending => "pending",
            CaseStatus::Approved => "approved",
            CaseStatus::Rejected => "rejected",
        }
    }

    /// Parse a status from a string, ignoring case
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(CaseStatus::Pending),
            "approved" => Some(CaseStatus::Approved),
            "rejected" => Some(CaseStatus::Rejected),
            _ => None,
        }
    }

    /// Resolve a transition to `target`, or `None` if the move is illegal
    pub fn transition(self, target: CaseStatus) -> Option<CaseStatus> {
        match (self, target) {
            (from, to) if from == to => Some(to),
            (CaseStatus::Pending, CaseStatus::Approved) => Some(CaseStatus::Approved),
            (CaseStatus::Pending, CaseStatus::Rejected) => Some(CaseStatus::Rejected),
            _ => None,
        }
    }

    /// Whether no further transitions leave this status
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CaseStatus::Pending)
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CaseStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ValidationError::new(format!("Invalid case status: {}", s)))
    }
}

/// Opaque handle to an uploaded evidence file
///
/// Issued by a [`BlobStore`](crate::traits::BlobStore); the case only keeps
/// the handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobRef(String);

impl BlobRef {
    /// Wrap a handle issued by a blob store
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw handle
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A submitted case
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    /// Unique identifier
    pub id: CaseId,

    /// Short title
    pub title: String,

    /// The submitter's argument
    pub argument: String,

    /// Plain-text evidence, empty when none was given
    pub evidence: String,

    /// Uploaded evidence document, if any
    pub evidence_file: Option<BlobRef>,

    /// Author of the case
    pub submitted_by: UserId,

    /// Review status
    pub status: CaseStatus,

    /// When the case was submitted (Unix seconds)
    pub created_at: u64,

    /// When the case was last changed (Unix seconds)
    pub updated_at: u64,
}

/// Fields supplied when submitting a case
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewCase {
    /// Short title (required)
    pub title: String,

    /// The argument (required)
    pub argument: String,

    /// Optional plain-text evidence
    pub evidence: Option<String>,
}

impl NewCase {
    /// Check required fields
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        validate_argument(&self.argument)
    }

    /// Build a pending case owned by `submitter`
    pub fn into_case(
        self,
        id: CaseId,
        submitter: UserId,
        evidence_file: Option<BlobRef>,
        now: u64,
    ) -> Result<Case, ValidationError> {
        self.validate()?;
        Ok(Case {
            id,
            title: self.title.trim().to_string(),
            argument: self.argument,
            evidence: self.evidence.unwrap_or_default(),
            evidence_file,
            submitted_by: submitter,
            status: CaseStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::new("title is required"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(ValidationError::new(format!(
            "title must be at most {} characters",
            MAX_TITLE_CHARS
        )));
    }
    Ok(())
}

fn validate_argument(argument: &str) -> Result<(), ValidationError> {
    if argument.trim().is_empty() {
        return Err(ValidationError::new("argument is required"));
    }
    Ok(())
}

/// Partial update of a case; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CasePatch {
    /// Replacement title
    pub title: Option<String>,

    /// Replacement argument
    pub argument: Option<String>,

    /// Replacement evidence text
    pub evidence: Option<String>,

    /// Replacement evidence document
    pub evidence_file: Option<BlobRef>,

    /// Target status, subject to [`CaseStatus::transition`]
    pub status: Option<CaseStatus>,
}

impl CasePatch {
    /// Whether the patch touches no field
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.argument.is_none()
            && self.evidence.is_none()
            && self.evidence_file.is_none()
            && self.status.is_none()
    }
}

/// Why a patch could not be applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseUpdateError {
    /// A supplied field is invalid
    Invalid(ValidationError),

    /// The requested status move is not part of the workflow
    IllegalTransition {
        /// Current status
        from: CaseStatus,
        /// Requested status
        to: CaseStatus,
    },
}

impl fmt::Display for CaseUpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseUpdateError::Invalid(e) => write!(f, "{}", e),
            CaseUpdateError::IllegalTransition { from, to } => {
                write!(f, "cannot move a {} case to {}", from, to)
            }
        }
    }
}

impl std::error::Error for CaseUpdateError {}

impl From<ValidationError> for CaseUpdateError {
    fn from(e: ValidationError) -> Self {
        CaseUpdateError::Invalid(e)
    }
}

impl Case {
    /// Apply `patch`, returning the updated case
    ///
    /// Validation runs before anything changes, so a failed patch leaves
    /// `self` untouched.
    pub fn apply(&self, patch: CasePatch, now: u64) -> Result<Case, CaseUpdateError> {
        if let Some(title) = &patch.title {
            validate_title(title)?;
        }
        if let Some(argument) = &patch.argument {
            validate_argument(argument)?;
        }
        let status = match patch.status {
            Some(target) => self
                .status
                .transition(target)
                .ok_or(CaseUpdateError::IllegalTransition {
                    from: self.status,
                    to: target,
                })?,
            None => self.status,
        };

        let mut updated = self.clone();
        if let Some(title) = patch.title {
            updated.title = title.trim().to_string();
        }
        if let Some(argument) = patch.argument {
            updated.argument = argument;
        }
        if let Some(evidence) = patch.evidence {
            updated.evidence = evidence;
        }
        if let Some(file) = patch.evidence_file {
            updated.evidence_file = Some(file);
        }
        updated.status = status;
        updated.updated_at = now.max(self.updated_at);
        Ok(updated)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// An evidence-only patch never disturbs title, argument or status
        #[test]
        fn test_evidence_patch_preserves_rest(evidence in ".*", now in 0u64..u64::MAX) {
            let case = NewCase {
                title: "t".to_string(),
                argument: "a".to_string(),
                evidence: None,
            }
            .into_case(CaseId::new(), UserId::new(), None, 10)
            .unwrap();

            let patch = CasePatch { evidence: Some(evidence.clone()), ..Default::default() };
            let updated = case.apply(patch, now).unwrap();

            prop_assert_eq!(&updated.evidence, &evidence);
            prop_assert_eq!(&updated.title, &case.title);
            prop_assert_eq!(&updated.argument, &case.argument);
            prop_assert_eq!(updated.status, case.status);
            prop_assert!(updated.updated_at >= case.updated_at);
        }
    }
}
