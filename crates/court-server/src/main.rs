//! Court Server CLI
//!
//! Starts the HTTP server for case review and juror voting.

use clap::Parser;
use court_server::{config::ServerConfig, start_server, ServerError};
use std::path::PathBuf;
use std::process;

/// Court case review and juror voting server
#[derive(Debug, Parser)]
#[command(name = "court-server")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "COURT_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), ServerError> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => {
            eprintln!("Warning: No config file specified, using default test configuration");
            eprintln!("Usage: court-server --config <path-to-config.toml>");
            eprintln!();
            ServerConfig::default_test_config()
        }
    };

    start_server(config).await
}
