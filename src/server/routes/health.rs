//! Health check endpoint

use crate::server::state::AppState;
use actix_web::{HttpResponse, web};
use std::borrow::Cow;
use std::time::Duration;
use tracing::debug;

/// Configure the health check route
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}

/// Basic health check endpoint
///
/// Returns a simple liveness document with build metadata and the process
/// uptime. Typically polled by load balancers and monitoring systems.
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    debug!("Health check requested");

    let status = HealthStatus {
        status: Cow::Borrowed("healthy"),
        version: Cow::Borrowed(env!("CARGO_PKG_VERSION")),
        revision: Cow::Borrowed(env!("GIT_HASH")),
        timestamp: chrono::Utc::now(),
        uptime: format_uptime(state.uptime()),
    };

    HttpResponse::Ok().json(status)
}

/// Health status document
#[derive(Debug, Clone, serde::Serialize)]
struct HealthStatus {
    status: Cow<'static, str>,
    version: Cow<'static, str>,
    revision: Cow<'static, str>,
    timestamp: chrono::DateTime<chrono::Utc>,
    uptime: String,
}

/// Render an uptime as a duration string, e.g. `"12.000138s"`.
///
/// Fractional seconds keep consecutive readings strictly increasing.
pub(crate) fn format_uptime(uptime: Duration) -> String {
    format!("{}s", uptime.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_format_is_parseable_seconds() {
        let rendered = format_uptime(Duration::from_millis(12_500));
        let parsed: f64 = rendered.strip_suffix('s').unwrap().parse().unwrap();
        assert!((parsed - 12.5).abs() < 1e-9);
    }

    #[test]
    fn uptime_format_orders_with_duration() {
        let a = format_uptime(Duration::from_millis(10));
        let b = format_uptime(Duration::from_millis(25));
        let a: f64 = a.strip_suffix('s').unwrap().parse().unwrap();
        let b: f64 = b.strip_suffix('s').unwrap().parse().unwrap();
        assert!(b > a);
    }
}
