//! Config command implementation.
//!
//! Shows the effective configuration, its location, or writes defaults.

use crate::cli::{Cli, ConfigAction, ConfigArgs};
use crate::config::Config;
use crate::error::{Result, ViewerError};

/// Run the config command.
pub fn run(cli: &Cli, args: &ConfigArgs) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli),
        ConfigAction::Path => {
            println!("{}", cli.config_path()?.display());
            Ok(())
        }
        ConfigAction::Init { force } => init_config(cli, *force),
    }
}

/// Show the configuration after overrides.
fn show_config(cli: &Cli) -> Result<()> {
    let config = cli.load_config()?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        let toml = toml::to_string_pretty(&config).map_err(|e| ViewerError::InvalidConfig {
            message: format!("Failed to serialize config: {e}"),
        })?;
        print!("{toml}");
    }
    Ok(())
}

/// Write a configuration file with default values.
fn init_config(cli: &Cli, force: bool) -> Result<()> {
    let path = cli.config_path()?;
    if path.exists() && !force {
        println!("Configuration file already exists at: {}", path.display());
        println!("Use 'ccv config init --force' to overwrite it.");
        return Ok(());
    }

    Config::default().save_to(&path)?;
    println!("Wrote default configuration to: {}", path.display());
    Ok(())
}
