//! HTTP middleware implementations
//!
//! This module provides the two cross-cutting layers every request passes
//! through:
//! - Panic recovery (failure containment, wraps the routes directly)
//! - Access logging (one structured record per request)
//!
//! plus the response observation primitives they share.

mod access_log;
mod observer;
mod recovery;


// Re-export all middleware
pub use access_log::{AccessLogMiddleware, AccessLogMiddlewareService};
pub use observer::{ObservedBody, ResponseMetrics};
pub use recovery::{ClientDisconnect, RecoveryMiddleware, RecoveryMiddlewareService};
