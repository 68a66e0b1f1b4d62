//! Ingest command: run texts through the gate of one collection.

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use colored::Colorize;
use memgate_core::{AddOutcome, MemorySource, Metadata};
use memgate_sdk::MemgateConfig;
use serde::Serialize;
use serde_json::Value;

use super::{describe_outcome, open_collection, preview};
use crate::cli::IngestArgs;

#[derive(Serialize)]
struct IngestRecord<'a> {
    text: &'a str,
    #[serde(flatten)]
    outcome: Value,
}

/// Execute ingest command.
pub async fn execute(args: IngestArgs, config: &MemgateConfig) -> Result<()> {
    let source = parse_source(&args.source)?;

    let mut texts = args.texts;
    if let Some(path) = &args.file {
        texts.extend(read_texts(path)?);
    }
    if texts.is_empty() {
        bail!("Nothing to ingest. Pass texts as arguments or use --file");
    }

    let (_memgate, memories) = open_collection(config, args.collection.as_deref())?;

    let mut stored: usize = 0;
    let mut rejected: usize = 0;
    let mut failed: usize = 0;

    for text in &texts {
        let mut metadata = Metadata::new();
        metadata.insert("ts".into(), Value::String(Utc::now().to_rfc3339()));

        match memories.add_memory(text, source, metadata).await {
            Ok(outcome) => {
                match &outcome {
                    AddOutcome::Stored { .. } => stored += 1,
                    AddOutcome::Rejected { .. } => rejected += 1,
                    AddOutcome::Skipped => {}
                }
                if args.json {
                    let record = IngestRecord {
                        text,
                        outcome: outcome_json(&outcome),
                    };
                    println!("{}", serde_json::to_string(&record)?);
                } else {
                    println!("{}  {}", describe_outcome(&outcome), preview(text, 60).dimmed());
                }
            }
            Err(e) if e.is_provider() => {
                failed += 1;
                eprintln!("{} {}  {}", "!".red(), e, preview(text, 60).dimmed());
            }
            Err(e) => return Err(e).context("Ingestion aborted"),
        }
    }

    if !args.json {
        println!();
        println!(
            "{} stored, {} rejected, {} skipped",
            stored.to_string().green(),
            rejected.to_string().yellow(),
            texts.len() - stored - rejected - failed
        );
    }

    if failed > 0 {
        bail!("{} text(s) could not be processed", failed);
    }
    Ok(())
}

/// Parse a `--source` value
pub(crate) fn parse_source(value: &str) -> Result<MemorySource> {
    match MemorySource::from_str(&value.trim().to_ascii_lowercase()) {
        Some(source) => Ok(source),
        None => bail!("Invalid source: {}. Use: user, assistant, or system", value),
    }
}

/// Non-blank lines of `path`, or of stdin when `path` is "-"
pub(crate) fn read_texts(path: &Path) -> Result<Vec<String>> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

fn outcome_json(outcome: &AddOutcome) -> Value {
    match outcome {
        AddOutcome::Skipped => serde_json::json!({ "status": "skipped" }),
        AddOutcome::Rejected { decision } => serde_json::json!({
            "status": "rejected",
            "decision": decision,
        }),
        AddOutcome::Stored { id, decision } => serde_json::json!({
            "status": "stored",
            "id": id,
            "decision": decision,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memgate_core::{DecisionReason, GateDecision};
    use tempfile::tempdir;

    #[test]
    fn test_parse_source() {
        assert_eq!(parse_source("user").unwrap(), MemorySource::User);
        assert_eq!(parse_source(" Assistant ").unwrap(), MemorySource::Assistant);
        assert!(parse_source("robot").is_err());
    }

    #[test]
    fn test_read_texts_skips_blank_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("texts.txt");
        std::fs::write(&path, "my sister lives in Oslo\n\n   \n  ok  \n").unwrap();

        let texts = read_texts(&path).unwrap();
        assert_eq!(texts, vec!["my sister lives in Oslo", "ok"]);
        assert!(read_texts(&dir.path().join("missing.txt")).is_err());
    }

    #[test]
    fn test_outcome_json() {
        let json = outcome_json(&AddOutcome::Stored {
            id: "mem-1".into(),
            decision: GateDecision::new(DecisionReason::DefaultKeep),
        });
        assert_eq!(json["status"], "stored");
        assert_eq!(json["id"], "mem-1");
        assert_eq!(json["decision"]["reason"], "default_keep");
    }
}
