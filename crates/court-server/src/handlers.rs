//! HTTP request handlers for the court service.
//!
//! Case, vote and evidence endpoints using axum. Account endpoints live in
//! [`crate::auth`].

use crate::auth::{self, CurrentUser};
use crate::session::{SessionError, SessionManager};
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, patch, post},
    Router as AxumRouter,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use court_domain::{Case, CaseId, CaseStatus, NewCase, User, ValidationError, Verdict, Vote};
use court_service::{CaseEdit, CaseService, ErrorKind, EvidenceUpload, ServiceError};
use court_store::{FsBlobStore, SqliteStore};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::error;

/// The service as wired for HTTP: SQLite records, files on disk
pub type CourtService = CaseService<SqliteStore, FsBlobStore>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Case and vote operations behind one connection
    pub service: Arc<Mutex<CourtService>>,
    /// Session manager for JWT token operations
    pub session_manager: Arc<SessionManager>,
}

impl AppState {
    /// Wrap a service and session manager for sharing across handlers
    pub fn new(service: CourtService, session_manager: SessionManager) -> Self {
        Self {
            service: Arc::new(Mutex::new(service)),
            session_manager: Arc::new(session_manager),
        }
    }

    /// Lock the service for one operation
    ///
    /// Never hold the guard across an `.await`.
    pub fn service(&self) -> Result<MutexGuard<'_, CourtService>, ApiError> {
        self.service
            .lock()
            .map_err(|_| ApiError::Internal("service lock poisoned".to_string()))
    }

    /// Largest request body accepted, sized for a base64 evidence upload
    fn body_limit(&self) -> usize {
        let max_evidence = self
            .service()
            .map(|service| service.config().max_evidence_bytes)
            .unwrap_or(court_service::DEFAULT_MAX_EVIDENCE_BYTES);
        max_evidence / 3 * 4 + 64 * 1024
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,
    /// Stable snake_case failure category
    pub code: String,
}

/// Errors surfaced to HTTP clients
#[derive(Debug, Error)]
pub enum ApiError {
    /// A service operation failed
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Missing, invalid or expired credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Shorthand for a 400 with a validation message
    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::Service(ServiceError::ValidationFailed(message.into()))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Service(e) => match e.kind() {
                ErrorKind::Forbidden => StatusCode::FORBIDDEN,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::ValidationFailed => StatusCode::BAD_REQUEST,
                ErrorKind::InvalidState => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Service(e) => e.kind().as_str(),
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Internal(_) => "internal",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Service(e) => e.message().to_string(),
            ApiError::Unauthorized(message) | ApiError::Internal(message) => message.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = Json(ErrorResponse {
            error: self.message(),
            code: self.code().to_string(),
        });
        (status, body).into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::TokenExpired => ApiError::Unauthorized("Token expired".to_string()),
            SessionError::InvalidToken => ApiError::Unauthorized("Invalid token".to_string()),
            SessionError::Signing(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Service(e.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid(rejection.body_text())
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Account as returned to clients; the password hash never leaves the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// User id
    pub id: String,
    /// Login name
    pub username: String,
    /// Contact address, possibly empty
    pub email: String,
    /// Current role
    pub role: String,
    /// Registration time (Unix seconds)
    pub created_at: u64,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            created_at: user.created_at,
        }
    }
}

/// Case as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResponse {
    /// Case id
    pub id: String,
    /// Short title
    pub title: String,
    /// The submitter's argument
    pub argument: String,
    /// Free-text evidence
    pub evidence: String,
    /// Download path for the attached evidence file, if any
    pub evidence_file: Option<String>,
    /// Submitting user's id
    pub submitted_by: String,
    /// pending, approved or rejected
    pub status: String,
    /// Submission time (Unix seconds)
    pub created_at: u64,
    /// Last change (Unix seconds)
    pub updated_at: u64,
}

impl From<&Case> for CaseResponse {
    fn from(case: &Case) -> Self {
        Self {
            id: case.id.to_string(),
            title: case.title.clone(),
            argument: case.argument.clone(),
            evidence: case.evidence.clone(),
            evidence_file: case
                .evidence_file
                .as_ref()
                .map(|_| format!("/case/evidence/{}", case.id)),
            submitted_by: case.submitted_by.to_string(),
            status: case.status.as_str().to_string(),
            created_at: case.created_at,
            updated_at: case.updated_at,
        }
    }
}

/// Vote as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteResponse {
    /// Vote id
    pub id: String,
    /// Case voted on
    pub case_id: String,
    /// Voting juror
    pub juror_id: String,
    /// guilty or not_guilty
    pub verdict: String,
    /// Time of the vote (Unix seconds)
    pub voted_at: u64,
}

impl From<&Vote> for VoteResponse {
    fn from(vote: &Vote) -> Self {
        Self {
            id: vote.id.to_string(),
            case_id: vote.case_id.to_string(),
            juror_id: vote.juror.to_string(),
            verdict: vote.verdict.as_str().to_string(),
            voted_at: vote.voted_at,
        }
    }
}

/// Dashboard row
#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardEntry {
    /// The case
    pub case: CaseResponse,
    /// Whether the caller has voted on it
    pub has_voted: bool,
}

/// Votes on one case with counts
#[derive(Debug, Serialize, Deserialize)]
pub struct VotesResponse {
    /// Case id
    pub case_id: String,
    /// Every vote, oldest first
    pub votes: Vec<VoteResponse>,
    /// Guilty verdicts
    pub guilty: usize,
    /// Not-guilty verdicts
    pub not_guilty: usize,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Overall health status
    pub status: String,
}

/// Evidence file embedded in a JSON body
#[derive(Debug, Deserialize)]
pub struct EvidenceFilePayload {
    /// Original file name
    pub filename: String,
    /// File contents, standard base64
    pub content_base64: String,
}

impl EvidenceFilePayload {
    fn decode(self) -> Result<EvidenceUpload, ApiError> {
        let bytes = STANDARD
            .decode(self.content_base64.trim())
            .map_err(|_| ApiError::invalid("evidence_file content is not valid base64"))?;
        Ok(EvidenceUpload {
            filename: self.filename,
            bytes,
        })
    }
}

/// Body of `POST /case/submit`
#[derive(Debug, Deserialize)]
pub struct SubmitCaseRequest {
    /// Short title
    #[serde(default)]
    pub title: String,
    /// The submitter's argument
    #[serde(default)]
    pub argument: String,
    /// Optional free-text evidence
    pub evidence: Option<String>,
    /// Optional evidence document
    pub evidence_file: Option<EvidenceFilePayload>,
}

/// Body of `PATCH /case/edit/:id`; omitted fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct EditCaseRequest {
    /// Replacement title
    pub title: Option<String>,
    /// Replacement argument
    pub argument: Option<String>,
    /// Replacement evidence text
    pub evidence: Option<String>,
    /// Target status
    pub status: Option<String>,
    /// Replacement evidence document
    pub evidence_file: Option<EvidenceFilePayload>,
}

/// Body of `POST /case/vote/:id`
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    /// guilty or not_guilty
    pub verdict: String,
}

fn parse_case_id(raw: &str) -> Result<CaseId, ApiError> {
    CaseId::from_string(raw).map_err(|_| ApiError::invalid(format!("Invalid case id: {}", raw)))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /case/submit
async fn submit_case(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<SubmitCaseRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CaseResponse>), ApiError> {
    let Json(request) = payload?;
    let file = request
        .evidence_file
        .map(EvidenceFilePayload::decode)
        .transpose()?;
    let new_case = NewCase {
        title: request.title,
        argument: request.argument,
        evidence: request.evidence,
    };

    let case = state
        .service()?
        .submit_case(&user.principal(), new_case, file)?;
    Ok((StatusCode::CREATED, Json(CaseResponse::from(&case))))
}

/// GET /case/all - approved cases only
async fn list_cases(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<CaseResponse>>, ApiError> {
    let cases = state.service()?.list_approved_cases(&user.principal())?;
    Ok(Json(cases.iter().map(CaseResponse::from).collect()))
}

/// GET /case/dashboard
async fn dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<DashboardEntry>>, ApiError> {
    let overview = state.service()?.dashboard(&user.principal())?;
    Ok(Json(
        overview
            .iter()
            .map(|row| DashboardEntry {
                case: CaseResponse::from(&row.case),
                has_voted: row.has_voted,
            })
            .collect(),
    ))
}

/// PATCH /case/edit/:id
async fn edit_case(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<EditCaseRequest>, JsonRejection>,
) -> Result<Json<CaseResponse>, ApiError> {
    let id = parse_case_id(&id)?;
    let Json(request) = payload?;
    let status = request
        .status
        .as_deref()
        .map(str::parse::<CaseStatus>)
        .transpose()?;
    let edit = CaseEdit {
        title: request.title,
        argument: request.argument,
        evidence: request.evidence,
        status,
        file: request
            .evidence_file
            .map(EvidenceFilePayload::decode)
            .transpose()?,
    };

    let case = state.service()?.edit_case(&user.principal(), id, edit)?;
    Ok(Json(CaseResponse::from(&case)))
}

/// POST /case/approve/:id
async fn approve_case(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<CaseResponse>, ApiError> {
    let id = parse_case_id(&id)?;
    let case = state.service()?.approve_case(&user.principal(), id)?;
    Ok(Json(CaseResponse::from(&case)))
}

/// POST /case/reject/:id
async fn reject_case(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<CaseResponse>, ApiError> {
    let id = parse_case_id(&id)?;
    let case = state.service()?.reject_case(&user.principal(), id)?;
    Ok(Json(CaseResponse::from(&case)))
}

/// DELETE /case/delete/:id
async fn delete_case(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_case_id(&id)?;
    state.service()?.delete_case(&user.principal(), id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /case/vote/:id
async fn cast_vote(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<VoteResponse>), ApiError> {
    let id = parse_case_id(&id)?;
    let Json(request) = payload?;
    let verdict: Verdict = request.verdict.parse()?;

    let vote = state.service()?.cast_vote(&user.principal(), id, verdict)?;
    Ok((StatusCode::CREATED, Json(VoteResponse::from(&vote))))
}

/// GET /case/votes/:id
async fn case_votes(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<VotesResponse>, ApiError> {
    let id = parse_case_id(&id)?;
    let summary = state.service()?.case_votes(&user.principal(), id)?;
    Ok(Json(VotesResponse {
        case_id: summary.case_id.to_string(),
        votes: summary.votes.iter().map(VoteResponse::from).collect(),
        guilty: summary.tally.guilty,
        not_guilty: summary.tally.not_guilty,
    }))
}

/// GET /case/evidence/:id - raw file bytes
async fn evidence_file(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_case_id(&id)?;
    let file = state.service()?.evidence_file(&user.principal(), id)?;

    // Stored handles are "<uuid>-<name>"; offer the original name
    let filename = file
        .name
        .split_once('-')
        .map(|(_, name)| name)
        .unwrap_or(&file.name)
        .to_string();
    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];
    Ok((headers, file.bytes).into_response())
}

/// GET /health
async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
    })
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    let body_limit = state.body_limit();

    AxumRouter::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/switch-role", post(auth::switch_role))
        .route("/case/submit", post(submit_case))
        .route("/case/all", get(list_cases))
        .route("/case/dashboard", get(dashboard))
        .route("/case/edit/:id", patch(edit_case))
        .route("/case/approve/:id", post(approve_case))
        .route("/case/reject/:id", post(reject_case))
        .route("/case/delete/:id", delete(delete_case))
        .route("/case/vote/:id", post(cast_vote))
        .route("/case/votes/:id", get(case_votes))
        .route("/case/evidence/:id", get(evidence_file))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
