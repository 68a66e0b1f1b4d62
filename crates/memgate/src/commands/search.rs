//! Search command.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use memgate_core::SearchQuery;
use memgate_sdk::MemgateConfig;

use super::{open_collection, preview};
use crate::cli::SearchArgs;

/// Execute search command.
pub async fn execute(args: SearchArgs, config: &MemgateConfig) -> Result<()> {
    if !(0.0..=1.0).contains(&args.min_score) {
        bail!("--min-score must be between 0 and 1");
    }

    let (_memgate, memories) = open_collection(config, args.collection.as_deref())?;

    let query = SearchQuery::new(args.query.as_str(), args.top_k).with_min_score(args.min_score);
    let results = memories
        .search_memory(&query)
        .await
        .context("Search failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("{}", "No matching memories.".dimmed());
        return Ok(());
    }

    println!("{}", format!("Memories ({}):", results.len()).bold());
    println!();
    for result in &results {
        println!(
            "  {}  {}  {}",
            format!("{:.3}", result.score).cyan(),
            result.memory.source.as_str().dimmed(),
            preview(&result.memory.content, 80)
        );
        println!("         {}", result.memory.id.dimmed());
    }

    Ok(())
}
