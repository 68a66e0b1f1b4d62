//! memgate - gated long-term memory CLI
//!
//! Thin front end over `memgate-sdk`: ingest texts through the gate, search
//! stored memories, or run an interactive session.

use anyhow::{Context, Result};
use clap::Parser;
use memgate_sdk::MemgateConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive(format!("memgate={level}").parse()?)
                .add_directive(format!("memgate_core={level}").parse()?)
                .add_directive(format!("memgate_sdk={level}").parse()?),
        )
        .init();

    // Load configuration
    let config_path = cli.config.clone().unwrap_or_else(MemgateConfig::config_path);
    let config = if config_path.exists() {
        MemgateConfig::load_from(&config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?
    } else {
        commands::config::starter_config()
    };
    tracing::debug!(
        path = %config_path.display(),
        exists = config_path.exists(),
        "Configuration resolved"
    );

    // Execute command
    match cli.command {
        Commands::Ingest(args) => commands::ingest::execute(args, &config).await,
        Commands::Search(args) => commands::search::execute(args, &config).await,
        Commands::Chat(args) => commands::chat::execute(args, &config).await,
        Commands::Config(cmd) => commands::config::execute(cmd, &config, &config_path),
        Commands::Version => {
            println!("memgate {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
