//! Error types for the futenote backend
//!
//! Only process-fatal conditions surface here: bad configuration, transport
//! failures, and shutdown overruns. Per-request failures are contained by the
//! recovery middleware and never reach these types.

use thiserror::Error;

/// Result type alias for the service
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Configuration errors (bad CLI flags)
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Fatal transport errors (bind failure, accept loop failure)
    #[error("Server error: {0}")]
    Server(String),

    /// Shutdown errors (drain exceeded the grace period, stop failure)
    #[error("Server shutdown: {0}")]
    Shutdown(String),
}

impl ServiceError {
    /// Create a server error from any displayable value
    pub fn server(msg: impl std::fmt::Display) -> Self {
        Self::Server(msg.to_string())
    }

    /// Create a shutdown error from any displayable value
    pub fn shutdown(msg: impl std::fmt::Display) -> Self {
        Self::Shutdown(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_preserves_cause_message() {
        let err = ServiceError::server("address already in use");
        assert_eq!(err.to_string(), "Server error: address already in use");

        let err = ServiceError::shutdown("grace period exceeded");
        assert_eq!(err.to_string(), "Server shutdown: grace period exceeded");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use");
        let err: ServiceError = io.into();
        assert!(matches!(err, ServiceError::Io(_)));
    }
}
