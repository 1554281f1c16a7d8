//! Annuaire server binary

use annuaire_server::{config::AppConfig, start_server};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Serve the annuaire ingestion pipeline over HTTP
#[derive(Parser, Debug)]
#[command(name = "annuaire-server", version, about)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "ANNUAIRE_CONFIG", default_value = "annuaire.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig::from_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    start_server(config).await?;
    Ok(())
}
