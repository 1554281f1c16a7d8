//! Settings command implementation.

use crate::cli::{SettingsAction, SettingsArgs};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::path::Path;

/// Execute the settings command.
pub fn execute_settings(
    args: SettingsArgs,
    config: &mut Config,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        SettingsAction::Show => {
            println!("Settings file: {}", Config::path()?.display());
            println!(
                "  Pipeline config: {}",
                config.pipeline_config.as_deref().unwrap_or("(not set)")
            );
            println!("  Format: {:?}", config.settings.format);
            println!("  Color: {}", config.settings.color);
        }
        SettingsAction::SetPipeline { path } => {
            if !Path::new(&path).is_file() {
                return Err(CliError::InvalidInput(format!("No such file: {}", path)));
            }
            config.pipeline_config = Some(path.clone());
            config.save()?;
            println!("{}", formatter.success(&format!("Pipeline config set to {}", path)));
        }
        SettingsAction::SetFormat { format } => {
            config.settings.format = format.into();
            config.save()?;
            println!("{}", formatter.success("Default format updated"));
        }
    }

    Ok(())
}
