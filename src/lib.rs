//! # futenote-rs
//!
//! Minimal HTTP service scaffold for the futenote backend.
//!
//! The crate provides exactly one composed handler chain for one process:
//!
//! - `GET /health` - liveness with uptime and build metadata
//! - `GET /openapi.yaml` - the embedded OpenAPI document, served verbatim
//! - `GET /debug/...` - profiling index and runtime variables
//!
//! Every request passes through a panic-recovery boundary and a structured
//! access-log layer; the server drains in-flight requests on SIGINT/SIGTERM
//! before exiting.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use futenote_rs::config::Config;
//! use futenote_rs::server::HttpServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let openapi = Bytes::from_static(b"openapi: 3.0.0\n");
//!     HttpServer::new(config, openapi).start().await?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod server;
pub mod utils;

pub use config::Config;
pub use server::HttpServer;
pub use utils::error::{Result, ServiceError};
