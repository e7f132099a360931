//! HTTP route modules
//!
//! All route handlers, organized by functionality. The full route table is
//! assembled once in `server::HttpServer::create_app`; nothing is registered
//! dynamically after startup.

pub mod debug;
pub mod health;
pub mod openapi;
