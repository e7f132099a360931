//! Application state shared across HTTP handlers

use crate::config::Config;
use bytes::Bytes;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// HTTP server state shared across handlers
///
/// Built once at startup and cloned into each worker; everything in here is
/// read-only for the lifetime of the process.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (shared read-only)
    pub config: Arc<Config>,
    /// Embedded OpenAPI document, served verbatim
    pub openapi: Bytes,
    /// Process start, for uptime reporting
    started_at: Instant,
}

impl AppState {
    /// Create a new AppState with shared resources
    pub fn new(config: Config, openapi: Bytes) -> Self {
        Self {
            config: Arc::new(config),
            openapi,
            started_at: Instant::now(),
        }
    }

    /// Time elapsed since the server state was created
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_increases() {
        let state = AppState::new(Config::default(), Bytes::from_static(b"openapi: 3.0.0\n"));
        let first = state.uptime();
        std::thread::sleep(Duration::from_millis(2));
        assert!(state.uptime() > first);
    }
}
