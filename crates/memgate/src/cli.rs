//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// memgate - gated long-term memory for conversations
///
/// Decides which messages are worth remembering and retrieves them later.
#[derive(Parser, Debug)]
#[command(name = "memgate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: $MEMGATE_CONFIG or <data dir>/config.toml)
    #[arg(long, global = true, env = "MEMGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Offer texts to the gate and store the accepted ones
    Ingest(IngestArgs),

    /// Search stored memories
    Search(SearchArgs),

    /// Interactive session: recall relevant memories, then record each line
    Chat(ChatArgs),

    /// Configuration management
    Config(ConfigCommand),

    /// Print version
    Version,
}

// ─────────────────────────────────────────────────────────────────────────────
// Ingest / Search
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Texts to ingest
    pub texts: Vec<String>,

    /// Read one text per line from a file ("-" for stdin)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Who produced the texts: user, assistant or system
    #[arg(short, long, default_value = "user")]
    pub source: String,

    /// Target collection (default: store.default_collection)
    #[arg(short, long)]
    pub collection: Option<String>,

    /// Emit one JSON object per text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Query text
    pub query: String,

    /// Maximum number of results
    #[arg(short = 'k', long, default_value = "5")]
    pub top_k: usize,

    /// Minimum similarity score (0-1)
    #[arg(short, long, default_value = "0.0")]
    pub min_score: f32,

    /// Collection to search (default: store.default_collection)
    #[arg(short, long)]
    pub collection: Option<String>,

    /// Emit results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Collection to use (default: store.default_collection)
    #[arg(short, long)]
    pub collection: Option<String>,

    /// Relevant memories to show per message
    #[arg(short, long, default_value = "3")]
    pub limit: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Commands
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,

    /// Print the config file location
    Path,

    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ingest() {
        let cli = Cli::try_parse_from([
            "memgate",
            "ingest",
            "my sister lives in Oslo",
            "ok",
            "--source",
            "assistant",
            "-c",
            "chat",
        ])
        .unwrap();

        match cli.command {
            Commands::Ingest(args) => {
                assert_eq!(args.texts, vec!["my sister lives in Oslo", "ok"]);
                assert_eq!(args.source, "assistant");
                assert_eq!(args.collection.as_deref(), Some("chat"));
                assert!(args.file.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_search_with_globals() {
        let cli = Cli::try_parse_from([
            "memgate",
            "search",
            "sister",
            "-k",
            "3",
            "--min-score",
            "0.7",
            "--config",
            "/tmp/memgate.toml",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/memgate.toml")));
        match cli.command {
            Commands::Search(args) => {
                assert_eq!(args.query, "sister");
                assert_eq!(args.top_k, 3);
                assert_eq!(args.min_score, 0.7);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_config_init() {
        let cli = Cli::try_parse_from(["memgate", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigCommand {
                action: ConfigAction::Init { force: true }
            })
        ));
    }
}
