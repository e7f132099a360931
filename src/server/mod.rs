//! HTTP server implementation
//!
//! This module provides the HTTP server, middleware, and routing.

pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

#[cfg(test)]
mod tests;

pub use server::HttpServer;
