//! Chat command: a line-oriented session over one collection.
//!
//! Each input line is answered with the memories relevant to it and then
//! recorded as a user turn. Lines starting with `/` are session commands.

use anyhow::{Context, Result};
use colored::Colorize;
use memgate_core::MemorySource;
use memgate_sdk::{MemgateConfig, Memgate, Session};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{describe_outcome, preview};
use crate::cli::ChatArgs;

/// Stored memories listed by `/memories`
const MEMORY_LIST_LIMIT: usize = 20;

/// Session commands recognised in chat input
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ChatInput<'a> {
    Quit,
    History,
    Memories,
    Help,
    Assistant(&'a str),
    Message(&'a str),
}

pub(crate) fn parse_input(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    match line {
        "/quit" | "/exit" => ChatInput::Quit,
        "/history" => ChatInput::History,
        "/memories" => ChatInput::Memories,
        "/help" => ChatInput::Help,
        _ => match line.strip_prefix("/assistant ") {
            Some(text) => ChatInput::Assistant(text.trim()),
            None => ChatInput::Message(line),
        },
    }
}

/// Execute chat command.
pub async fn execute(args: ChatArgs, config: &MemgateConfig) -> Result<()> {
    let memgate = Memgate::new(config.clone()).context("Failed to start memgate")?;
    let mut session = memgate
        .session(args.collection.as_deref())
        .context("Failed to open session")?;

    println!(
        "{} session {} on collection {}",
        "memgate".bold(),
        session.id().dimmed(),
        session.collection().cyan()
    );
    println!("{}", "Type /help for commands, /quit to leave.".dimmed());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        match parse_input(&line) {
            ChatInput::Quit => break,
            ChatInput::Help => print_help(),
            ChatInput::History => print_history(&session),
            ChatInput::Memories => print_memories(&session).await?,
            ChatInput::Assistant(text) => {
                record(&mut session, MemorySource::Assistant, text).await?;
            }
            ChatInput::Message(text) if text.is_empty() => {}
            ChatInput::Message(text) => {
                let memories = session
                    .relevant_memories(text, args.limit)
                    .await
                    .context("Memory search failed")?;
                if !memories.is_empty() {
                    println!("{}", "Relevant memories:".bold());
                    for memory in &memories {
                        println!("  • {}", preview(memory, 100));
                    }
                }
                record(&mut session, MemorySource::User, text).await?;
            }
        }
    }

    Ok(())
}

async fn record(session: &mut Session, role: MemorySource, text: &str) -> Result<()> {
    match session.record(role, text).await {
        Ok(outcome) => println!("{}", describe_outcome(&outcome)),
        Err(e) if e.is_provider() => eprintln!("{} {}", "!".red(), e),
        Err(e) => return Err(e).context("Session aborted"),
    }
    Ok(())
}

fn print_history(session: &Session) {
    for turn in session.recent_turns() {
        println!(
            "  {} {}  {}",
            turn.at.format("%H:%M:%S").to_string().dimmed(),
            turn.role.as_str().cyan(),
            preview(&turn.content, 80)
        );
    }
}

async fn print_memories(session: &Session) -> Result<()> {
    let memories = session
        .orchestrator()
        .recent_memories(MEMORY_LIST_LIMIT)
        .await
        .context("Failed to list memories")?;

    if memories.is_empty() {
        println!("{}", "No stored memories.".dimmed());
    }
    for memory in &memories {
        println!(
            "  {}  {}  {}",
            memory.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            memory.source.as_str().cyan(),
            preview(&memory.content, 80)
        );
    }
    Ok(())
}

fn print_help() {
    println!("  /history            show recent turns");
    println!("  /memories           list stored memories, newest first");
    println!("  /assistant <text>   record an assistant turn");
    println!("  /quit               leave the session");
}
