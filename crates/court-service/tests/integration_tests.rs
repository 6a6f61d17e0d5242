//! Integration tests for the case service
//!
//! Runs every operation against a real SQLite store and checks the role
//! gates, the status workflow and the one-vote rule.

use court_domain::traits::{CaseQuery, CourtStore, UserInsert, VoteInsert};
use court_domain::{
    Case, CaseId, CaseStatus, NewCase, Principal, Role, User, UserId, Verdict, Vote,
};
use court_service::{CaseEdit, CaseService, ErrorKind, EvidenceUpload, ServiceError};
use court_store::{MemoryBlobStore, SqliteStore, StoreError};
use std::sync::{Arc, Barrier};
use std::thread;

type Service = CaseService<SqliteStore, MemoryBlobStore>;

fn service() -> Service {
    CaseService::new(SqliteStore::new(":memory:").unwrap(), MemoryBlobStore::new())
}

fn member(service: &mut Service, name: &str, role: Role) -> Principal {
    let user = service
        .register(name, &format!("{}@example.com", name), "hash".to_string(), role)
        .unwrap();
    Principal::from(&user)
}

fn new_case(title: &str) -> NewCase {
    NewCase {
        title: title.to_string(),
        argument: format!("Argument for {}", title),
        evidence: Some("a witness statement".to_string()),
    }
}

struct Court {
    service: Service,
    plaintiff: Principal,
    judge: Principal,
    juror: Principal,
}

fn court() -> Court {
    let mut service = service();
    let plaintiff = member(&mut service, "pat", Role::Plaintiff);
    let judge = member(&mut service, "judy", Role::Judge);
    let juror = member(&mut service, "jules", Role::Juror);
    Court {
        service,
        plaintiff,
        judge,
        juror,
    }
}

fn approved_case(court: &mut Court, title: &str) -> CaseId {
    let case = court
        .service
        .submit_case(&court.plaintiff, new_case(title), None)
        .unwrap();
    court.service.approve_case(&court.judge, case.id).unwrap();
    case.id
}

#[test]
fn test_voting_scenario() {
    let mut court = court();

    // Juror votes guilty on approved case #1
    let case1 = approved_case(&mut court, "Case 1");
    let vote = court
        .service
        .cast_vote(&court.juror, case1, Verdict::Guilty)
        .unwrap();
    assert_eq!(vote.case_id, case1);
    assert_eq!(vote.juror, court.juror.user_id);
    assert_eq!(vote.verdict, Verdict::Guilty);

    // Same juror again -> Conflict
    let again = court.service.cast_vote(&court.juror, case1, Verdict::NotGuilty);
    assert_eq!(again.unwrap_err().kind(), ErrorKind::Conflict);

    // Non-juror -> Forbidden
    let by_plaintiff = court.service.cast_vote(&court.plaintiff, case1, Verdict::Guilty);
    assert_eq!(by_plaintiff.unwrap_err().kind(), ErrorKind::Forbidden);

    // Judge approves pending case #2, juror votes on it
    let case2 = court
        .service
        .submit_case(&court.plaintiff, new_case("Case 2"), None)
        .unwrap();
    assert_eq!(case2.status, CaseStatus::Pending);
    let approved = court.service.approve_case(&court.judge, case2.id).unwrap();
    assert_eq!(approved.status, CaseStatus::Approved);
    assert!(court
        .service
        .cast_vote(&court.juror, case2.id, Verdict::NotGuilty)
        .is_ok());

    let summary = court.service.case_votes(&court.judge, case1).unwrap();
    assert_eq!(summary.votes.len(), 1);
    assert_eq!(summary.tally.guilty, 1);
}

#[test]
fn test_vote_on_unapproved_case_is_invalid_state() {
    let mut court = court();
    let pending = court
        .service
        .submit_case(&court.plaintiff, new_case("Pending"), None)
        .unwrap();
    let rejected = court
        .service
        .submit_case(&court.plaintiff, new_case("Rejected"), None)
        .unwrap();
    court.service.reject_case(&court.judge, rejected.id).unwrap();

    for id in [pending.id, rejected.id] {
        for verdict in [Verdict::Guilty, Verdict::NotGuilty] {
            let err = court.service.cast_vote(&court.juror, id, verdict).unwrap_err();
            assert_eq!(
                err,
                ServiceError::InvalidState("Can only vote on approved cases".to_string())
            );
        }
    }
}

#[test]
fn test_vote_on_missing_case_is_not_found() {
    let mut court = court();
    let err = court
        .service
        .cast_vote(&court.juror, CaseId::new(), Verdict::Guilty)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_submit_requires_party_role() {
    let mut court = court();
    for principal in [court.judge, court.juror] {
        let err = court
            .service
            .submit_case(&principal, new_case("Nope"), None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    let all = court.service.dashboard(&court.judge).unwrap();
    assert!(all.is_empty(), "no case may be created by a forbidden submit");

    let defendant = member(&mut court.service, "dee", Role::Defendant);
    let case = court
        .service
        .submit_case(&defendant, new_case("Counter claim"), None)
        .unwrap();
    assert_eq!(case.submitted_by, defendant.user_id);
    assert_eq!(case.status, CaseStatus::Pending);
}

#[test]
fn test_submit_validates_fields() {
    let mut court = court();
    let missing_title = NewCase {
        title: String::new(),
        argument: "a".to_string(),
        evidence: None,
    };
    let err = court
        .service
        .submit_case(&court.plaintiff, missing_title, None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);

    let missing_argument = NewCase {
        title: "t".to_string(),
        argument: "  ".to_string(),
        evidence: None,
    };
    let err = court
        .service
        .submit_case(&court.plaintiff, missing_argument, None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
}

#[test]
fn test_list_approved_only() {
    let mut court = court();
    let approved = approved_case(&mut court, "Approved");
    court
        .service
        .submit_case(&court.plaintiff, new_case("Pending"), None)
        .unwrap();

    for principal in [court.plaintiff, court.judge, court.juror] {
        let cases = court.service.list_approved_cases(&principal).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].id, approved);
    }
}

#[test]
fn test_dashboard_marks_voted_cases() {
    let mut court = court();
    let voted = approved_case(&mut court, "Voted");
    let open = approved_case(&mut court, "Open");
    court
        .service
        .cast_vote(&court.juror, voted, Verdict::Guilty)
        .unwrap();

    let overview = court.service.dashboard(&court.juror).unwrap();
    assert_eq!(overview.len(), 2);
    for entry in overview {
        assert_eq!(entry.has_voted, entry.case.id == voted);
        assert!(entry.case.id == voted || entry.case.id == open);
    }
}

#[test]
fn test_edit_is_partial() {
    let mut court = court();
    let case = court
        .service
        .submit_case(&court.plaintiff, new_case("Original"), None)
        .unwrap();

    let edited = court
        .service
        .edit_case(
            &court.judge,
            case.id,
            CaseEdit {
                argument: Some("Revised argument".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(edited.argument, "Revised argument");
    assert_eq!(edited.title, case.title);
    assert_eq!(edited.evidence, case.evidence);
    assert_eq!(edited.status, case.status);
    assert_eq!(edited.submitted_by, case.submitted_by);

    let stored = court.service.store().get_case(case.id).unwrap().unwrap();
    assert_eq!(stored, edited);
}

#[test]
fn test_edit_requires_judge_and_existing_case() {
    let mut court = court();
    let case = court
        .service
        .submit_case(&court.plaintiff, new_case("Original"), None)
        .unwrap();

    let err = court
        .service
        .edit_case(&court.plaintiff, case.id, CaseEdit::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = court
        .service
        .edit_case(&court.judge, CaseId::new(), CaseEdit::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_edit_status_follows_workflow() {
    let mut court = court();
    let id = approved_case(&mut court, "Done");

    let err = court
        .service
        .edit_case(
            &court.judge,
            id,
            CaseEdit {
                title: Some("Renamed".to_string()),
                status: Some(CaseStatus::Pending),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let stored = court.service.store().get_case(id).unwrap().unwrap();
    assert_eq!(stored.title, "Done", "failed edit changes nothing");
    assert_eq!(stored.status, CaseStatus::Approved);
}

#[test]
fn test_review_transitions() {
    let mut court = court();
    let case = court
        .service
        .submit_case(&court.plaintiff, new_case("Review"), None)
        .unwrap();

    let err = court.service.approve_case(&court.juror, case.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    court.service.reject_case(&court.judge, case.id).unwrap();
    // Rejecting twice is harmless, approving a rejected case is not
    assert!(court.service.reject_case(&court.judge, case.id).is_ok());
    let err = court.service.approve_case(&court.judge, case.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let err = court
        .service
        .approve_case(&court.judge, CaseId::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_delete_cascades_votes() {
    let mut court = court();
    let id = approved_case(&mut court, "Doomed");
    let second_juror = member(&mut court.service, "jo", Role::Juror);
    court.service.cast_vote(&court.juror, id, Verdict::Guilty).unwrap();
    court
        .service
        .cast_vote(&second_juror, id, Verdict::NotGuilty)
        .unwrap();

    let err = court.service.delete_case(&court.juror, id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    court.service.delete_case(&court.judge, id).unwrap();
    assert!(court.service.store().get_case(id).unwrap().is_none());
    assert!(court.service.store().list_votes(id).unwrap().is_empty());

    let err = court.service.delete_case(&court.judge, id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_delete_allowed_from_any_status() {
    let mut court = court();
    let pending = court
        .service
        .submit_case(&court.plaintiff, new_case("Pending"), None)
        .unwrap();
    let rejected = court
        .service
        .submit_case(&court.plaintiff, new_case("Rejected"), None)
        .unwrap();
    court.service.reject_case(&court.judge, rejected.id).unwrap();
    let approved = approved_case(&mut court, "Approved");

    for id in [pending.id, rejected.id, approved] {
        assert!(court.service.delete_case(&court.judge, id).is_ok());
    }
}

#[test]
fn test_switch_role() {
    let mut court = court();
    let updated = court.service.switch_role(&court.plaintiff, Role::Judge).unwrap();
    assert_eq!(updated.role, Role::Judge);

    let as_judge = Principal::from(&updated);
    let back = court.service.switch_role(&as_judge, Role::Juror).unwrap();
    assert_eq!(back.role, Role::Juror);

    for role in [Role::Defendant, Role::Plaintiff] {
        let err = court.service.switch_role(&as_judge, role).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    }
}

#[test]
fn test_evidence_file_roundtrip() {
    let mut court = court();
    let case = court
        .service
        .submit_case(
            &court.plaintiff,
            new_case("With file"),
            Some(EvidenceUpload {
                filename: "contract.pdf".to_string(),
                bytes: b"%PDF-1.7".to_vec(),
            }),
        )
        .unwrap();
    assert!(case.evidence_file.is_some());

    let file = court.service.evidence_file(&court.plaintiff, case.id).unwrap();
    assert_eq!(file.bytes, b"%PDF-1.7");
    assert!(file.name.ends_with("contract.pdf"));

    // Jurors only see evidence once the case is approved
    let err = court.service.evidence_file(&court.juror, case.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    court.service.approve_case(&court.judge, case.id).unwrap();
    assert!(court.service.evidence_file(&court.juror, case.id).is_ok());
}

#[test]
fn test_edit_replaces_evidence_file() {
    let mut court = court();
    let case = court
        .service
        .submit_case(&court.plaintiff, new_case("Swap"), None)
        .unwrap();
    let err = court.service.evidence_file(&court.judge, case.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    court
        .service
        .edit_case(
            &court.judge,
            case.id,
            CaseEdit {
                file: Some(EvidenceUpload {
                    filename: "photo.png".to_string(),
                    bytes: vec![1, 2, 3],
                }),
                ..Default::default()
            },
        )
        .unwrap();

    let file = court.service.evidence_file(&court.judge, case.id).unwrap();
    assert_eq!(file.bytes, vec![1, 2, 3]);
}

#[test]
fn test_concurrent_votes_through_separate_services() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("court.db");

    let mut setup = CaseService::new(SqliteStore::new(&path).unwrap(), MemoryBlobStore::new());
    let plaintiff = member(&mut setup, "pat", Role::Plaintiff);
    let judge = member(&mut setup, "judy", Role::Judge);
    let juror = member(&mut setup, "jules", Role::Juror);
    let case = setup.submit_case(&plaintiff, new_case("Race"), None).unwrap();
    setup.approve_case(&judge, case.id).unwrap();

    const WORKERS: usize = 6;
    let services: Vec<Service> = (0..WORKERS)
        .map(|_| CaseService::new(SqliteStore::new(&path).unwrap(), MemoryBlobStore::new()))
        .collect();
    let barrier = Arc::new(Barrier::new(WORKERS));

    let handles: Vec<_> = services
        .into_iter()
        .map(|mut service| {
            let barrier = Arc::clone(&barrier);
            let case_id = case.id;
            thread::spawn(move || {
                barrier.wait();
                service.cast_vote(&juror, case_id, Verdict::Guilty)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(e) if e.kind() == ErrorKind::Conflict))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(conflicts, WORKERS - 1);
    assert_eq!(setup.store().list_votes(case.id).unwrap().len(), 1);
}

/// What happens to the case between the service's checks and the vote insert
#[derive(Clone, Copy)]
enum Interference {
    Delete,
    Reject,
}

/// SQLite store that alters the voted-on case just before writing the vote
struct InterferingStore {
    inner: SqliteStore,
    interference: Interference,
}

impl CourtStore for InterferingStore {
    type Error = StoreError;

    fn insert_user(&mut self, user: &User) -> Result<UserInsert, StoreError> {
        self.inner.insert_user(user)
    }

    fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.inner.get_user(id)
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_username(username)
    }

    fn set_role(&mut self, id: UserId, role: Role) -> Result<bool, StoreError> {
        self.inner.set_role(id, role)
    }

    fn insert_case(&mut self, case: &Case) -> Result<(), StoreError> {
        self.inner.insert_case(case)
    }

    fn get_case(&self, id: CaseId) -> Result<Option<Case>, StoreError> {
        self.inner.get_case(id)
    }

    fn update_case(&mut self, case: &Case) -> Result<bool, StoreError> {
        self.inner.update_case(case)
    }

    fn delete_case(&mut self, id: CaseId) -> Result<bool, StoreError> {
        self.inner.delete_case(id)
    }

    fn query_cases(&self, query: &CaseQuery) -> Result<Vec<Case>, StoreError> {
        self.inner.query_cases(query)
    }

    fn insert_vote(&mut self, vote: &Vote) -> Result<VoteInsert, StoreError> {
        match self.interference {
            Interference::Delete => {
                self.inner.delete_case(vote.case_id)?;
            }
            Interference::Reject => {
                if let Some(mut case) = self.inner.get_case(vote.case_id)? {
                    case.status = CaseStatus::Rejected;
                    self.inner.update_case(&case)?;
                }
            }
        }
        self.inner.insert_vote(vote)
    }

    fn find_vote(&self, case_id: CaseId, juror: UserId) -> Result<Option<Vote>, StoreError> {
        self.inner.find_vote(case_id, juror)
    }

    fn list_votes(&self, case_id: CaseId) -> Result<Vec<Vote>, StoreError> {
        self.inner.list_votes(case_id)
    }
}

type InterferedService = CaseService<InterferingStore, MemoryBlobStore>;

fn enlist(service: &mut InterferedService, name: &str, role: Role) -> Principal {
    let user = service.register(name, "", "hash".to_string(), role).unwrap();
    Principal::from(&user)
}

/// Vote on an approved case while `interference` changes it mid-flight
fn vote_during(interference: Interference) -> (ServiceError, InterferedService, CaseId) {
    let store = InterferingStore {
        inner: SqliteStore::new(":memory:").unwrap(),
        interference,
    };
    let mut service = CaseService::new(store, MemoryBlobStore::new());
    let plaintiff = enlist(&mut service, "pat", Role::Plaintiff);
    let judge = enlist(&mut service, "judy", Role::Judge);
    let juror = enlist(&mut service, "jules", Role::Juror);

    let case = service
        .submit_case(&plaintiff, new_case("Shifting"), None)
        .unwrap();
    service.approve_case(&judge, case.id).unwrap();

    let err = service
        .cast_vote(&juror, case.id, Verdict::Guilty)
        .unwrap_err();
    (err, service, case.id)
}

#[test]
fn test_case_deleted_before_vote_insert_is_not_found() {
    let (err, service, case_id) = vote_during(Interference::Delete);

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(service.store().get_case(case_id).unwrap().is_none());
    assert!(service.store().list_votes(case_id).unwrap().is_empty());
}

#[test]
fn test_case_unapproved_before_vote_insert_is_invalid_state() {
    let (err, service, case_id) = vote_during(Interference::Reject);

    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert_eq!(err.message(), "Can only vote on approved cases");
    let case = service.store().get_case(case_id).unwrap().unwrap();
    assert_eq!(case.status, CaseStatus::Rejected);
    assert!(service.store().list_votes(case_id).unwrap().is_empty());
}
