//! Authorization policy
//!
//! One function decides whether a principal may perform an action on a
//! resource. Every service operation calls it before touching storage.

use court_domain::{Case, CaseId, CaseStatus, Principal, Role, UserId};

/// Something a principal can attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Submit a new case
    SubmitCase,
    /// List approved cases
    ListApproved,
    /// See every case with the caller's voting state
    Dashboard,
    /// Change case fields
    EditCase,
    /// Move a case to approved
    ApproveCase,
    /// Move a case to rejected
    RejectCase,
    /// Remove a case and its votes
    DeleteCase,
    /// Cast a verdict
    CastVote,
    /// Change a user's role
    SwitchRole,
    /// Read the votes on a case
    ViewVotes,
    /// Download a case's evidence file
    ViewEvidence,
}

/// What an action targets
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    /// The case collection as a whole
    Catalog,
    /// A loaded case
    Case(&'a Case),
    /// A case known only by id
    CaseId(CaseId),
    /// A user account
    User(UserId),
}

/// Outcome of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The action may proceed
    Allow,
    /// The action is refused, with a reason for the caller
    Deny(&'static str),
}

impl Decision {
    /// Whether the action may proceed
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

fn require(condition: bool, reason: &'static str) -> Decision {
    if condition {
        Decision::Allow
    } else {
        Decision::Deny(reason)
    }
}

/// Decide whether `principal` may perform `action` on `resource`
pub fn authorize(principal: &Principal, action: Action, resource: Resource<'_>) -> Decision {
    let role = principal.role;
    match action {
        Action::SubmitCase => require(
            role.is_party(),
            "Only defendants and plaintiffs can submit cases",
        ),
        Action::ListApproved | Action::Dashboard => Decision::Allow,
        Action::EditCase => require(role == Role::Judge, "Only judges can edit cases"),
        Action::ApproveCase | Action::RejectCase => {
            require(role == Role::Judge, "Only judges can review cases")
        }
        Action::DeleteCase => require(role == Role::Judge, "Only judges can delete cases"),
        Action::CastVote => require(role == Role::Juror, "Only jurors can vote"),
        Action::ViewVotes => require(role == Role::Judge, "Only judges can view votes"),
        Action::SwitchRole => match resource {
            Resource::User(target) => require(
                target == principal.user_id,
                "Users can only change their own role",
            ),
            _ => Decision::Deny("Role changes target a user"),
        },
        Action::ViewEvidence => match resource {
            Resource::Case(case) => require(
                role == Role::Judge
                    || case.submitted_by == principal.user_id
                    || case.status == CaseStatus::Approved,
                "Evidence is visible to judges, the submitter, or once approved",
            ),
            _ => require(role == Role::Judge, "Evidence requires a loaded case"),
        },
    }
}
