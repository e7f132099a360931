//! Futenote backend - minimal HTTP service scaffold
//!
//! Health endpoint, embedded OpenAPI document, debug routes, structured
//! access logging, panic recovery and graceful shutdown.

use bytes::Bytes;
use clap::Parser;
use futenote_rs::config::Cli;
use futenote_rs::server::HttpServer;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Embedded OpenAPI document, served verbatim at `GET /openapi.yaml`.
static OPENAPI: &[u8] = include_bytes!("../api/openapi.yaml");

#[tokio::main]
async fn main() -> ExitCode {
    // One JSON record per line; per-request fields come from the middleware
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_config();

    match HttpServer::new(config, Bytes::from_static(OPENAPI)).start().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Print error using Display (not Debug) to preserve newlines
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
