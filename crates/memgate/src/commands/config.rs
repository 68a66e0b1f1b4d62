//! Config command.

use std::path::Path;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use memgate_core::GateConfig;
use memgate_sdk::{ClassifierSettings, MemgateConfig, StoreSettings};

use crate::cli::{ConfigAction, ConfigCommand};

/// Execute config command.
pub fn execute(cmd: ConfigCommand, config: &MemgateConfig, path: &Path) -> Result<()> {
    match cmd.action {
        ConfigAction::Show => {
            print!("{}", config.to_toml().context("Failed to render config")?);
            Ok(())
        }
        ConfigAction::Path => {
            let status = if path.exists() { "" } else { " (not created)" };
            println!("{}{}", path.display(), status.dimmed());
            Ok(())
        }
        ConfigAction::Init { force } => {
            init(path, force)?;
            println!("{} Wrote {}", "✓".green(), path.display());
            Ok(())
        }
    }
}

/// Write a starter config with the conversational phrase lists
pub(crate) fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists. Use --force to overwrite", path.display());
    }

    starter_config()
        .save_to(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Conversational gate, keyword classifier and a SQLite store in the data
/// directory, so memories outlive the process
pub(crate) fn starter_config() -> MemgateConfig {
    let defaults = MemgateConfig::default();
    defaults
        .clone()
        .with_gate(GateConfig::conversational())
        .with_classifier(ClassifierSettings {
            provider: Some("keyword".into()),
            ..Default::default()
        })
        .with_store(StoreSettings {
            provider: "sqlite".into(),
            ..defaults.store
        })
}
