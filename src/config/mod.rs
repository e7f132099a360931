//! Configuration for the futenote backend
//!
//! Command-line flags are the only configuration source. The server listens
//! on `--port` (default 8080) and drains for a fixed grace period on
//! shutdown.

use clap::Parser;
use std::time::Duration;

/// Grace period for draining in-flight requests during shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Command-line interface for the futenote binary.
///
/// Unknown flags terminate the process with usage printed, before the
/// server starts.
#[derive(Debug, Parser)]
#[command(name = "futenote", version, about = "Futenote backend HTTP API")]
pub struct Cli {
    /// Port for the HTTP API
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
}

impl Cli {
    /// Convert parsed flags into the runtime configuration.
    pub fn into_config(self) -> Config {
        Config {
            port: self.port,
            ..Config::default()
        }
    }
}

/// Runtime configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Interface to bind
    pub host: String,
    /// TCP listen port; 0 lets the OS assign one
    pub port: u16,
    /// Maximum time to wait for in-flight requests during shutdown
    pub shutdown_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl Config {
    /// Socket address string the server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_port_is_8080() {
        let cli = Cli::try_parse_from(["futenote"]).unwrap();
        assert_eq!(cli.port, 8080);
    }

    #[test]
    fn port_flag_overrides_default() {
        let cli = Cli::try_parse_from(["futenote", "--port", "9000"]).unwrap();
        let config = cli.into_config();
        assert_eq!(config.port, 9000);
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
    }

    #[test]
    fn unknown_flag_is_rejected_with_usage() {
        let err = Cli::try_parse_from(["futenote", "--bogus"]).unwrap_err();
        assert!(err.to_string().contains("Usage"));
    }

    #[test]
    fn shutdown_timeout_defaults_to_grace_period() {
        let config = Config::default();
        assert_eq!(config.shutdown_timeout, DEFAULT_SHUTDOWN_TIMEOUT);
    }
}
