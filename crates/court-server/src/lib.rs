//! Court Server
//!
//! HTTP front end for case submission, judicial review and juror voting.
//! Wires the SQLite store and on-disk evidence files into the case service
//! and exposes it over axum with JWT bearer sessions.

#![warn(missing_docs)]

pub mod auth;
pub mod config;
pub mod handlers;
pub mod session;

use config::ServerConfig;
use court_service::{CaseService, ServiceConfig};
use court_store::{BlobError, FsBlobStore, SqliteStore, StoreError};
use handlers::{create_router, AppState};
use session::SessionManager;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Database could not be opened
    #[error("Database error: {0}")]
    Store(#[from] StoreError),

    /// Evidence directory could not be prepared
    #[error("Evidence storage error: {0}")]
    Blob(#[from] BlobError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Open storage and build the shared handler state from configuration
pub fn build_state(config: &ServerConfig) -> Result<AppState, ServerError> {
    let store = SqliteStore::new(&config.database_path)?;
    let blobs = FsBlobStore::new(&config.evidence_dir)?;
    let service = CaseService::with_config(
        store,
        blobs,
        ServiceConfig::default().with_max_evidence_bytes(config.max_evidence_bytes),
    );
    let session_manager = SessionManager::new(&config.jwt_secret, config.token_expiry_secs);

    Ok(AppState::new(service, session_manager))
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over `default_filter`. A second call is a no-op.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Start the court HTTP server
///
/// Opens storage, builds the router and serves until the process exits.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    init_tracing(&config.log_level);

    info!("Starting court server");
    info!("Bind address: {}", config.bind_addr());
    info!("Database: {}", config.database_path.display());
    info!("Evidence directory: {}", config.evidence_dir.display());
    info!("Token expiry: {} seconds", config.token_expiry_secs);

    let state = build_state(&config)?;
    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Court server listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    Ok(())
}
