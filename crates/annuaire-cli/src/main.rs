//! Annuaire CLI - Command-line interface for the annuaire ingestion pipeline.

use annuaire_cli::commands;
use annuaire_cli::{Cli, Command, Config, Formatter};
use annuaire_server::AppIngestor;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_default();

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Settings(args) => commands::execute_settings(args, &mut config, &formatter)?,
        Command::Ingest(args) => {
            let ingestor = open_pipeline(&config, cli.config.as_deref())?;
            commands::execute_ingest(args, &ingestor, &formatter).await?
        }
        Command::List(args) => {
            let ingestor = open_pipeline(&config, cli.config.as_deref())?;
            commands::execute_list(args, &ingestor, &formatter).await?
        }
        Command::Replace(args) => {
            let ingestor = open_pipeline(&config, cli.config.as_deref())?;
            commands::execute_replace(args, &ingestor, &formatter).await?
        }
        Command::Add(args) => {
            let ingestor = open_pipeline(&config, cli.config.as_deref())?;
            commands::execute_add(args, &ingestor, &formatter).await?
        }
    }

    Ok(())
}

fn open_pipeline(config: &Config, explicit: Option<&str>) -> anyhow::Result<AppIngestor> {
    let app_config = config.app_config(explicit)?;
    Ok(annuaire_server::build_ingestor(&app_config)?)
}
