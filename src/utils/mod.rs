//! Utility modules for the futenote backend

pub mod error;

pub use error::{Result, ServiceError};
