//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            let config_path = Settings::default_config_path();
            println!("{}", config_path.display());
        }

        ConfigAction::Init { force } => {
            let config_path = Settings::default_config_path();
            if write_default_config(&config_path, *force)? {
                Output::success(&format!("Wrote default config to {}", config_path.display()));
            } else {
                Output::info(&format!("Config already exists at {}", config_path.display()));
                Output::info("Use --force to overwrite it.");
            }
        }
    }

    Ok(())
}

/// Write the default settings to `path`. Returns false when the file exists and `force` is off.
fn write_default_config(path: &PathBuf, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    Settings::default().save_to(path)?;
    Ok(true)
}
