//! Resolver error types

use thiserror::Error;

/// Errors that can occur while looking for duplicates
#[derive(Error, Debug)]
pub enum ResolverError {
    /// The store lookup failed
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
