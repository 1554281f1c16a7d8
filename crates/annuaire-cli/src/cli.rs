//! CLI command definitions and argument parsing.

use annuaire_domain::RecordKind;
use clap::{Parser, Subcommand};

/// Annuaire CLI - Ingest directory and event records.
#[derive(Debug, Parser)]
#[command(name = "annuaire")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Pipeline configuration file (TOML)
    #[arg(short, long, global = true, env = "ANNUAIRE_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (ids only)
    Quiet,
}

/// Record kind argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum KindArg {
    /// Directory entries (`annuaire`)
    #[value(alias = "directory")]
    Annuaire,
    /// Event entries (`evenement`)
    #[value(aliases = ["event", "evenements"])]
    Evenement,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract records from a page, file or text and store the new ones
    Ingest(IngestArgs),

    /// List stored records
    List(ListArgs),

    /// Overwrite stored records from a JSON array carrying `numero`
    Replace(PayloadArgs),

    /// Insert one record from a JSON object, without duplicate check
    Add(PayloadArgs),

    /// Manage CLI settings
    Settings(SettingsArgs),
}

/// Arguments for the ingest command.
#[derive(Debug, Parser)]
pub struct IngestArgs {
    /// Record kind to extract
    #[arg(value_enum)]
    pub kind: KindArg,

    /// Web page to read
    #[arg(short, long)]
    pub url: Option<String>,

    /// File to read (.csv, or any UTF-8 text)
    #[arg(long)]
    pub file: Option<String>,

    /// Text to read
    #[arg(short, long)]
    pub text: Option<String>,

    /// Read the text from stdin
    #[arg(long)]
    pub stdin: bool,
}

/// Arguments for the list command.
#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Record kind to list
    #[arg(value_enum)]
    pub kind: KindArg,
}

/// Arguments for commands that take a JSON payload.
#[derive(Debug, Parser)]
pub struct PayloadArgs {
    /// Record kind
    #[arg(value_enum)]
    pub kind: KindArg,

    /// JSON file holding the payload
    #[arg(long)]
    pub file: Option<String>,

    /// Read the payload from stdin
    #[arg(long)]
    pub stdin: bool,
}

/// Arguments for settings management.
#[derive(Debug, Parser)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub action: SettingsAction,
}

/// Settings management actions.
#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    /// Show current settings
    Show,

    /// Remember the pipeline configuration file
    SetPipeline {
        /// Path to the TOML file
        path: String,
    },

    /// Choose the default output format
    SetFormat {
        /// Output format
        #[arg(value_enum)]
        format: CliFormat,
    },
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<KindArg> for RecordKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Annuaire => RecordKind::DirectoryEntry,
            KindArg::Evenement => RecordKind::EventEntry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_command() {
        let cli = Cli::parse_from(["annuaire", "ingest", "annuaire", "--text", "Jean Dupont"]);
        match cli.command {
            Command::Ingest(args) => {
                assert_eq!(args.kind, KindArg::Annuaire);
                assert_eq!(args.text.as_deref(), Some("Jean Dupont"));
            }
            _ => panic!("Expected Ingest command"),
        }
    }

    #[test]
    fn test_kind_aliases() {
        let cli = Cli::parse_from(["annuaire", "list", "event", "--format", "json"]);
        match cli.command {
            Command::List(args) => assert_eq!(args.kind, KindArg::Evenement),
            _ => panic!("Expected List command"),
        }
        assert!(matches!(cli.format, Some(CliFormat::Json)));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert!(Cli::try_parse_from(["annuaire", "list", "contacts"]).is_err());
    }

    #[test]
    fn test_kind_conversion() {
        let kind: RecordKind = KindArg::Evenement.into();
        assert_eq!(kind, RecordKind::EventEntry);
    }
}
