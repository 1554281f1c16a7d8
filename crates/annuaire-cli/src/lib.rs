//! Annuaire CLI library.
//!
//! Drives the ingestion pipeline locally: ingest a page, file or text, list
//! stored records, and apply replace or add payloads, with table or JSON
//! output.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
