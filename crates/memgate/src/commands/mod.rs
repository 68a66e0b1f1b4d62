//! Command implementations for the memgate CLI.
//!
//! Each submodule implements the logic for one command.

pub mod chat;
pub mod config;
pub mod ingest;
pub mod search;

use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use memgate_core::{AddOutcome, MemoryOrchestrator};
use memgate_sdk::{Memgate, MemgateConfig};

/// Build the engine and open `collection` (or the default one)
pub(crate) fn open_collection(
    config: &MemgateConfig,
    collection: Option<&str>,
) -> Result<(Memgate, Arc<MemoryOrchestrator>)> {
    let memgate = Memgate::new(config.clone()).context("Failed to start memgate")?;
    let orchestrator = match collection {
        Some(name) => memgate.collection(name),
        None => memgate.default_collection(),
    }
    .context("Failed to open collection")?;
    Ok((memgate, orchestrator))
}

/// First `max` characters of `text` on one line, with an ellipsis if cut
pub(crate) fn preview(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

/// One-line colored summary of an ingestion outcome
pub(crate) fn describe_outcome(outcome: &AddOutcome) -> String {
    match outcome {
        AddOutcome::Skipped => format!("{} skipped (blank)", "-".dimmed()),
        AddOutcome::Rejected { decision } => {
            let mut line = format!("{} rejected [{}]", "✗".red(), decision.reason.as_str().yellow());
            if let Some(similarity) = decision.max_similarity {
                line.push_str(&format!(" similarity={:.3}", similarity));
            }
            if let Some(confidence) = decision.confidence {
                line.push_str(&format!(" confidence={:.2}", confidence));
            }
            line
        }
        AddOutcome::Stored { id, decision } => format!(
            "{} stored [{}] {}",
            "✓".green(),
            decision.reason.as_str().cyan(),
            id.dimmed()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memgate_core::{DecisionReason, GateDecision};

    #[test]
    fn test_preview() {
        assert_eq!(preview("short text", 20), "short text");
        assert_eq!(preview("line one\n  line two", 40), "line one line two");
        assert_eq!(preview("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn test_describe_outcome() {
        colored::control::set_override(false);

        let stored = AddOutcome::Stored {
            id: "mem-1".into(),
            decision: GateDecision::new(DecisionReason::ForcedKeep),
        };
        assert_eq!(describe_outcome(&stored), "✓ stored [forced_keep] mem-1");

        let rejected = AddOutcome::Rejected {
            decision: GateDecision::new(DecisionReason::Duplicate).with_similarity(Some(0.95)),
        };
        assert_eq!(describe_outcome(&rejected), "✗ rejected [duplicate] similarity=0.950");

        assert_eq!(describe_outcome(&AddOutcome::Skipped), "- skipped (blank)");
    }
}
