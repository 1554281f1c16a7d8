//! Annuaire Server
//!
//! HTTP front end of the ingestion pipeline. Builds the provider, store and
//! text acquirer from one [`AppConfig`] and serves the list, process,
//! replace and add routes with axum.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use annuaire_extractor::Extractor;
use annuaire_llm::{AnyProvider, LlmError};
use annuaire_pipeline::{AcquisitionError, BatchCoordinator, Ingestor, SourceReader};
use annuaire_resolver::DuplicateResolver;
use annuaire_store::{SqliteStore, StoreError};
use config::{AppConfig, ConfigError};
use handlers::{create_router, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// The pipeline as wired by the server and the CLI
pub type AppIngestor = Ingestor<AnyProvider, SqliteStore, SourceReader>;

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The store could not be opened
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The model provider could not be built
    #[error("LLM provider error: {0}")]
    Llm(#[from] LlmError),

    /// The text acquirer could not be built
    #[error("Acquisition setup error: {0}")]
    Acquisition(#[from] AcquisitionError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Wire provider, extractor, resolver, store and acquirer from configuration
pub fn build_ingestor(config: &AppConfig) -> Result<AppIngestor, ServerError> {
    let provider = AnyProvider::from_config(&config.llm)?;
    let model_name = provider.model_name().to_string();
    let extractor = Extractor::new(provider, config.extractor.clone()).with_model_name(&model_name);
    let coordinator = BatchCoordinator::new(DuplicateResolver::new(config.resolver.clone()));
    let store = SqliteStore::new(&config.database.path)?;
    let sources = SourceReader::new(config.acquisition.clone())?;

    info!(
        database = %config.database.path,
        provider = ?config.llm.provider,
        model = %model_name,
        threshold = config.resolver.similarity_threshold,
        "Pipeline ready"
    );

    Ok(Ingestor::new(extractor, coordinator, store, sources))
}

/// Start the HTTP server
///
/// Builds the pipeline from `config`, then serves until the process stops.
pub async fn start_server(config: AppConfig) -> Result<(), ServerError> {
    info!("Starting Annuaire server");

    let state = AppState {
        ingestor: Arc::new(build_ingestor(&config)?),
        max_upload_bytes: config.server.max_upload_bytes,
    };
    let app = create_router(state);

    let listener = TcpListener::bind(&config.server.bind_addr()).await?;
    info!("Listening on {}", config.server.bind_addr());

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_from_test_config() {
        let ingestor = build_ingestor(&AppConfig::default_test_config()).unwrap();
        let store = ingestor.store();
        assert!(!store.lock().unwrap().in_transaction());
    }

    #[test]
    fn test_unopenable_database_is_reported() {
        let mut config = AppConfig::default_test_config();
        config.database.path = "/nonexistent-dir/annuaire.db".to_string();
        assert!(matches!(build_ingestor(&config), Err(ServerError::Store(_))));
    }
}
