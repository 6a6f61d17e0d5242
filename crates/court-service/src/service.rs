//! Case and vote operations

use crate::policy::{authorize, Action, Decision, Resource};
use crate::{ServiceConfig, ServiceError};
use court_domain::traits::{BlobStore, CaseQuery, CourtStore, UserInsert, VoteInsert};
use court_domain::{
    unix_now, BlobRef, Case, CaseId, CasePatch, CaseStatus, NewCase, Principal, Role, Tally,
    User, UserId, Verdict, Vote,
};
use std::fmt::Display;
use tracing::{debug, info, warn};

/// Result alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// An uploaded evidence document awaiting storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceUpload {
    /// Name supplied by the uploader
    pub filename: String,

    /// File contents
    pub bytes: Vec<u8>,
}

/// Fields a judge may change on a case; `None` leaves a field as it is
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseEdit {
    /// Replacement title
    pub title: Option<String>,

    /// Replacement argument
    pub argument: Option<String>,

    /// Replacement evidence text
    pub evidence: Option<String>,

    /// Target status
    pub status: Option<CaseStatus>,

    /// Replacement evidence document
    pub file: Option<EvidenceUpload>,
}

/// A case as seen on a user's dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct CaseOverview {
    /// The case
    pub case: Case,

    /// Whether the viewing user has voted on it
    pub has_voted: bool,
}

/// Votes cast on one case
#[derive(Debug, Clone, PartialEq)]
pub struct VoteSummary {
    /// The case voted on
    pub case_id: CaseId,

    /// Individual votes, oldest first
    pub votes: Vec<Vote>,

    /// Verdict counts
    pub tally: Tally,
}

/// A stored evidence document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceFile {
    /// Storage handle, usable as a download name
    pub name: String,

    /// File contents
    pub bytes: Vec<u8>,
}

fn storage<E: Display>(e: E) -> ServiceError {
    ServiceError::Storage(e.to_string())
}

fn blob<E: Display>(e: E) -> ServiceError {
    ServiceError::Blob(e.to_string())
}

fn case_not_found(id: CaseId) -> ServiceError {
    ServiceError::NotFound(format!("Case {} not found", id))
}

/// Every state-changing operation on cases and votes
///
/// Each operation takes the acting [`Principal`] explicitly, checks it with
/// [`authorize`] first, then validates input, then writes through the store.
pub struct CaseService<S, B> {
    store: S,
    blobs: B,
    config: ServiceConfig,
}

impl<S, B> CaseService<S, B>
where
    S: CourtStore,
    S::Error: Display,
    B: BlobStore,
    B::Error: Display,
{
    /// Create a service with default limits
    pub fn new(store: S, blobs: B) -> Self {
        Self::with_config(store, blobs, ServiceConfig::default())
    }

    /// Create a service with explicit limits
    pub fn with_config(store: S, blobs: B, config: ServiceConfig) -> Self {
        Self {
            store,
            blobs,
            config,
        }
    }

    /// Limits this service enforces
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The evidence file store
    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The underlying store, mutably
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    fn check(
        &self,
        principal: &Principal,
        action: Action,
        resource: Resource<'_>,
    ) -> ServiceResult<()> {
        match authorize(principal, action, resource) {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => {
                warn!(
                    user_id = %principal.user_id,
                    role = %principal.role,
                    ?action,
                    reason,
                    "denied"
                );
                Err(ServiceError::Forbidden(reason.to_string()))
            }
        }
    }

    fn load_case(&self, id: CaseId) -> ServiceResult<Case> {
        self.store
            .get_case(id)
            .map_err(storage)?
            .ok_or_else(|| case_not_found(id))
    }

    fn store_upload(&self, upload: &EvidenceUpload) -> ServiceResult<BlobRef> {
        if upload.bytes.len() > self.config.max_evidence_bytes {
            return Err(ServiceError::ValidationFailed(format!(
                "evidence file exceeds {} bytes",
                self.config.max_evidence_bytes
            )));
        }
        self.blobs.put(&upload.filename, &upload.bytes).map_err(blob)
    }

    /// Best-effort removal of a file no case refers to
    fn discard_upload(&self, handle: &BlobRef) {
        if let Err(e) = self.blobs.delete(handle) {
            warn!(blob = %handle, error = %e, "failed to remove orphaned evidence file");
        }
    }

    // ---------------------------------------------------------------------
    // Accounts
    // ---------------------------------------------------------------------

    /// Create an account from already-hashed credentials
    pub fn register(
        &mut self,
        username: &str,
        email: &str,
        password_hash: String,
        role: Role,
    ) -> ServiceResult<User> {
        let user = User::register(username, email, password_hash, role, unix_now())?;
        match self.store.insert_user(&user).map_err(storage)? {
            UserInsert::Inserted => {
                info!(
                    user_id = %user.id,
                    username = %user.username,
                    role = %user.role,
                    "registered user"
                );
                Ok(user)
            }
            UserInsert::UsernameTaken => Err(ServiceError::ValidationFailed(
                "Username already exists".to_string(),
            )),
        }
    }

    /// Look up an account by id
    pub fn user(&self, id: UserId) -> ServiceResult<Option<User>> {
        self.store.get_user(id).map_err(storage)
    }

    /// Look up an account by username
    pub fn user_by_username(&self, username: &str) -> ServiceResult<Option<User>> {
        self.store
            .find_user_by_username(username.trim())
            .map_err(storage)
    }

    /// Switch the caller's own role to juror or judge
    pub fn switch_role(&mut self, principal: &Principal, new_role: Role) -> ServiceResult<User> {
        self.check(principal, Action::SwitchRole, Resource::User(principal.user_id))?;
        if !new_role.can_switch_to_self_service() {
            return Err(ServiceError::ValidationFailed(format!(
                "Cannot switch to {}; choose juror or judge",
                new_role
            )));
        }

        if !self
            .store
            .set_role(principal.user_id, new_role)
            .map_err(storage)?
        {
            return Err(ServiceError::NotFound(format!(
                "User {} not found",
                principal.user_id
            )));
        }

        info!(
            user_id = %principal.user_id,
            from = %principal.role,
            to = %new_role,
            "switched role"
        );
        self.user(principal.user_id)?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", principal.user_id)))
    }

    // ---------------------------------------------------------------------
    // Cases
    // ---------------------------------------------------------------------

    /// Submit a new pending case owned by the caller
    pub fn submit_case(
        &mut self,
        principal: &Principal,
        new_case: NewCase,
        file: Option<EvidenceUpload>,
    ) -> ServiceResult<Case> {
        self.check(principal, Action::SubmitCase, Resource::Catalog)?;
        new_case.validate()?;

        let uploaded = file
            .as_ref()
            .map(|f| self.store_upload(f))
            .transpose()?;
        let submitted = new_case
            .into_case(CaseId::new(), principal.user_id, uploaded.clone(), unix_now())
            .map_err(ServiceError::from)
            .and_then(|case| {
                self.store.insert_case(&case).map_err(storage)?;
                Ok(case)
            });

        match submitted {
            Ok(case) => {
                info!(case_id = %case.id, submitted_by = %case.submitted_by, "submitted case");
                Ok(case)
            }
            Err(e) => {
                if let Some(handle) = &uploaded {
                    self.discard_upload(handle);
                }
                Err(e)
            }
        }
    }

    /// All approved cases, oldest first
    pub fn list_approved_cases(&self, principal: &Principal) -> ServiceResult<Vec<Case>> {
        self.check(principal, Action::ListApproved, Resource::Catalog)?;
        let cases = self
            .store
            .query_cases(&CaseQuery::with_status(CaseStatus::Approved))
            .map_err(storage)?;
        debug!(count = cases.len(), "listed approved cases");
        Ok(cases)
    }

    /// Every case, flagged with whether the caller has voted on it
    pub fn dashboard(&self, principal: &Principal) -> ServiceResult<Vec<CaseOverview>> {
        self.check(principal, Action::Dashboard, Resource::Catalog)?;
        let cases = self
            .store
            .query_cases(&CaseQuery::default())
            .map_err(storage)?;

        cases
            .into_iter()
            .map(|case| {
                let has_voted = self
                    .store
                    .find_vote(case.id, principal.user_id)
                    .map_err(storage)?
                    .is_some();
                Ok(CaseOverview { case, has_voted })
            })
            .collect()
    }

    /// Partially update a case; omitted fields stay unchanged
    pub fn edit_case(
        &mut self,
        principal: &Principal,
        id: CaseId,
        edit: CaseEdit,
    ) -> ServiceResult<Case> {
        self.check(principal, Action::EditCase, Resource::CaseId(id))?;
        let current = self.load_case(id)?;

        let patch = CasePatch {
            title: edit.title,
            argument: edit.argument,
            evidence: edit.evidence,
            evidence_file: None,
            status: edit.status,
        };
        let mut updated = current.apply(patch, unix_now())?;
        let uploaded = edit
            .file
            .as_ref()
            .map(|f| self.store_upload(f))
            .transpose()?;
        if let Some(handle) = &uploaded {
            updated.evidence_file = Some(handle.clone());
        }

        let written = match self.store.update_case(&updated) {
            Ok(true) => Ok(()),
            Ok(false) => Err(case_not_found(id)),
            Err(e) => Err(storage(e)),
        };
        if let Err(e) = written {
            if let Some(handle) = &uploaded {
                self.discard_upload(handle);
            }
            return Err(e);
        }

        // The replaced file is no longer referenced
        if let (Some(_), Some(previous)) = (&uploaded, &current.evidence_file) {
            self.discard_upload(previous);
        }

        info!(case_id = %id, status = %updated.status, "edited case");
        Ok(updated)
    }

    /// Approve a pending case
    pub fn approve_case(&mut self, principal: &Principal, id: CaseId) -> ServiceResult<Case> {
        self.review(principal, id, Action::ApproveCase, CaseStatus::Approved)
    }

    /// Reject a pending case
    pub fn reject_case(&mut self, principal: &Principal, id: CaseId) -> ServiceResult<Case> {
        self.review(principal, id, Action::RejectCase, CaseStatus::Rejected)
    }

    fn review(
        &mut self,
        principal: &Principal,
        id: CaseId,
        action: Action,
        target: CaseStatus,
    ) -> ServiceResult<Case> {
        self.check(principal, action, Resource::CaseId(id))?;
        let current = self.load_case(id)?;

        let patch = CasePatch {
            status: Some(target),
            ..Default::default()
        };
        let updated = current.apply(patch, unix_now())?;
        if !self.store.update_case(&updated).map_err(storage)? {
            return Err(case_not_found(id));
        }

        info!(case_id = %id, from = %current.status, to = %target, "reviewed case");
        Ok(updated)
    }

    /// Delete a case and every vote cast on it
    pub fn delete_case(&mut self, principal: &Principal, id: CaseId) -> ServiceResult<()> {
        self.check(principal, Action::DeleteCase, Resource::CaseId(id))?;
        let file = self.load_case(id)?.evidence_file;
        if !self.store.delete_case(id).map_err(storage)? {
            return Err(case_not_found(id));
        }
        if let Some(handle) = &file {
            self.discard_upload(handle);
        }
        info!(case_id = %id, "deleted case");
        Ok(())
    }

    /// Download the evidence document attached to a case
    pub fn evidence_file(&self, principal: &Principal, id: CaseId) -> ServiceResult<EvidenceFile> {
        let case = self.load_case(id)?;
        self.check(principal, Action::ViewEvidence, Resource::Case(&case))?;

        let handle = case
            .evidence_file
            .ok_or_else(|| ServiceError::NotFound(format!("Case {} has no evidence file", id)))?;
        let bytes = self
            .blobs
            .get(&handle)
            .map_err(blob)?
            .ok_or_else(|| ServiceError::NotFound(format!("Evidence file {} is missing", handle)))?;

        Ok(EvidenceFile {
            name: handle.as_str().to_string(),
            bytes,
        })
    }

    // ---------------------------------------------------------------------
    // Votes
    // ---------------------------------------------------------------------

    /// Record the caller's verdict on an approved case
    ///
    /// The duplicate-vote lookup only produces a clean error early; the
    /// store's uniqueness constraint decides.
    pub fn cast_vote(
        &mut self,
        principal: &Principal,
        id: CaseId,
        verdict: Verdict,
    ) -> ServiceResult<Vote> {
        self.check(principal, Action::CastVote, Resource::CaseId(id))?;

        let case = self.load_case(id)?;
        if case.status != CaseStatus::Approved {
            return Err(ServiceError::InvalidState(
                "Can only vote on approved cases".to_string(),
            ));
        }

        if self
            .store
            .find_vote(id, principal.user_id)
            .map_err(storage)?
            .is_some()
        {
            return Err(already_voted());
        }

        let vote = Vote::new(id, principal.user_id, verdict, unix_now());
        match self.store.insert_vote(&vote).map_err(storage)? {
            VoteInsert::Inserted => {
                info!(case_id = %id, juror = %principal.user_id, verdict = %verdict, "vote cast");
                Ok(vote)
            }
            VoteInsert::AlreadyVoted => Err(already_voted()),
            VoteInsert::CaseUnavailable => {
                // The case changed between the read above and the insert
                match self.store.get_case(id).map_err(storage)? {
                    None => Err(case_not_found(id)),
                    Some(_) => Err(ServiceError::InvalidState(
                        "Can only vote on approved cases".to_string(),
                    )),
                }
            }
        }
    }

    /// Votes on a case with the verdict tally
    pub fn case_votes(&self, principal: &Principal, id: CaseId) -> ServiceResult<VoteSummary> {
        self.check(principal, Action::ViewVotes, Resource::CaseId(id))?;
        self.load_case(id)?;

        let votes = self.store.list_votes(id).map_err(storage)?;
        let tally = Tally::of(&votes);
        Ok(VoteSummary {
            case_id: id,
            votes,
            tally,
        })
    }
}

fn already_voted() -> ServiceError {
    ServiceError::Conflict("You have already voted on this case".to_string())
}
