//! Authentication: password hashing, bearer tokens and account endpoints.

use crate::handlers::{ApiError, AppState, UserResponse};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{rejection::JsonRejection, FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::Json,
};
use court_domain::{Principal, Role, User};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Hash a password into a PHC string
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))
}

/// Check a password against a stored PHC string
///
/// A hash that does not parse never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Run CPU-heavy hashing off the async workers
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("Hashing task failed: {}", e)))
}

/// The authenticated account making a request
///
/// Loaded fresh from the store on every request, so a role switch applies
/// to the next call without logging in again.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    /// Identity and role used for authorization
    pub fn principal(&self) -> Principal {
        Principal::from(&self.0)
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

        let user_id = state.session_manager.authenticate(token.trim())?;

        let user = state
            .service()?
            .user(user_id)?
            .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;
        Ok(CurrentUser(user))
    }
}

/// Body of `POST /auth/signup`
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    /// Login name
    #[serde(default)]
    pub username: String,
    /// Contact address
    #[serde(default)]
    pub email: String,
    /// Plain-text password, hashed before storage
    #[serde(default)]
    pub password: String,
    /// Initial role; defendant when omitted
    pub role: Option<String>,
}

/// Body of `POST /auth/login`
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login name
    pub username: String,
    /// Plain-text password
    pub password: String,
}

/// Successful login
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for later requests
    pub token: String,
    /// The logged-in account
    pub user: UserResponse,
    /// Confirmation text
    pub message: String,
}

/// Body of `POST /auth/switch-role`
#[derive(Debug, Deserialize)]
pub struct SwitchRoleRequest {
    /// juror or judge
    pub role: String,
}

/// POST /auth/signup
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let Json(request) = payload?;
    let role = match request.role.as_deref() {
        Some(raw) => raw.parse::<Role>()?,
        None => Role::default(),
    };
    if request.password.is_empty() {
        return Err(ApiError::invalid("Password is required"));
    }

    let password = request.password;
    let password_hash = blocking(move || hash_password(&password)).await??;

    let user = state
        .service()?
        .register(&request.username, &request.email, password_hash, role)?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;
    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let user = state.service()?.user_by_username(&request.username)?;
    let Some(user) = user else {
        warn!(username = %request.username, "login for unknown user");
        return Err(invalid());
    };

    let password = request.password;
    let stored = user.password_hash.clone();
    if !blocking(move || verify_password(&password, &stored)).await? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(invalid());
    }

    let token = state.session_manager.issue_token(user.id)?;
    info!(user_id = %user.id, "logged in");
    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(&user),
        message: "Login successful".to_string(),
    }))
}

/// POST /auth/switch-role
pub async fn switch_role(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<SwitchRoleRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Json(request) = payload?;
    let role: Role = request.role.parse()?;

    let updated = state.service()?.switch_role(&user.principal(), role)?;
    Ok(Json(UserResponse::from(&updated)))
}
