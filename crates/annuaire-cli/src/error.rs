//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// CLI settings error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pipeline configuration could not be loaded
    #[error(transparent)]
    AppConfig(#[from] annuaire_server::config::ConfigError),

    /// Pipeline could not be built
    #[error(transparent)]
    Setup(#[from] annuaire_server::ServerError),

    /// Pipeline error
    #[error(transparent)]
    Ingest(#[from] annuaire_pipeline::IngestError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
