//! Interactive chat REPL (`docqa chat`).
//!
//! Every non-command line is a query against the session. Errors are
//! printed and the loop continues; the conversation is never lost to a
//! failed action.
//!
//! | Command | Effect |
//! |---------|--------|
//! | `/embed <paths…>` | Index documents; replaces the active index on success |
//! | `/reset` | Clear the conversation and drop the index |
//! | `/history` | Print the conversation so far |
//! | `/help` | List commands |
//! | `/quit` | Leave, dropping any index built in this session |

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use docqa_core::index::Indexer;
use docqa_core::progress::IndexProgress;
use docqa_core::respond::Responder;
use docqa_core::session::Session;

use crate::ask::{create_responder, print_answer};
use crate::config::{Config, Secrets};
use crate::ingest::{create_indexer, prepare};

const HELP: &str = "\
commands:
  /embed <paths...>  index documents (files or directories)
  /reset             clear the conversation and drop the index
  /history           show the conversation
  /help              show this help
  /quit              exit
anything else is a question.";

/// A parsed REPL line.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Embed(Vec<PathBuf>),
    Reset,
    History,
    Help,
    Quit,
    Ask(String),
    Empty,
    Unknown(String),
}

fn parse_line(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    if !line.starts_with('/') {
        return Command::Ask(line.to_string());
    }
    let mut parts = line.split_whitespace();
    match parts.next().unwrap_or_default() {
        "/embed" => Command::Embed(parts.map(PathBuf::from).collect()),
        "/reset" => Command::Reset,
        "/history" => Command::History,
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    }
}

struct Repl<'a> {
    config: &'a Config,
    indexer: Indexer,
    responder: Responder,
    progress: &'a dyn IndexProgress,
    session: Session,
}

impl Repl<'_> {
    async fn embed(&mut self, paths: &[PathBuf]) -> Result<()> {
        if paths.is_empty() {
            anyhow::bail!("usage: /embed <paths...>");
        }
        let prepared = prepare(self.config, paths)?;
        let handle = self
            .session
            .rebuild_index(
                &self.indexer,
                &self.config.vector_store.collection,
                &prepared.chunks,
                self.progress,
            )
            .await?;
        println!(
            "indexed {} documents ({} chunks) into {}",
            prepared.documents,
            prepared.chunks.len(),
            handle.collection()
        );
        Ok(())
    }

    async fn ask(&mut self, query: &str) -> Result<()> {
        let answer = self.session.ask(&self.responder, query).await?;
        print_answer(&answer);
        Ok(())
    }

    fn history(&self) {
        let turns = self.session.conversation().all();
        if turns.is_empty() {
            println!("(no conversation yet)");
        }
        for turn in turns {
            println!(
                "[{}] {}: {}",
                turn.at.format("%H:%M:%S"),
                turn.role.as_str(),
                turn.content
            );
        }
    }

    /// Handle one line. Returns `false` when the user asked to leave.
    async fn handle(&mut self, line: &str) -> bool {
        let outcome = match parse_line(line) {
            Command::Empty => Ok(()),
            Command::Quit => return false,
            Command::Help => {
                println!("{}", HELP);
                Ok(())
            }
            Command::Reset => {
                self.session.reset().await;
                println!("conversation cleared");
                Ok(())
            }
            Command::History => {
                self.history();
                Ok(())
            }
            Command::Embed(paths) => self.embed(&paths).await,
            Command::Ask(query) => self.ask(&query).await,
            Command::Unknown(cmd) => Err(anyhow::anyhow!("unknown command {} (try /help)", cmd)),
        };
        if let Err(e) = outcome {
            warn!(error = %e, "chat action failed");
            eprintln!("error: {:#}", e);
        }
        true
    }
}

/// Run the REPL on stdin/stdout, optionally indexing `docs` first.
pub async fn run_chat(
    config: &Config,
    secrets: &Secrets,
    docs: Vec<PathBuf>,
    progress: &dyn IndexProgress,
) -> Result<()> {
    let mut repl = Repl {
        config,
        indexer: create_indexer(config, secrets)?,
        responder: create_responder(config, secrets)?,
        progress,
        session: Session::new(),
    };

    if !docs.is_empty() {
        if let Err(e) = repl.embed(&docs).await {
            eprintln!("error: {:#}", e);
        }
    }

    println!("docqa chat: ask a question, or /help for commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let outcome = loop {
        print!("> ");
        let _ = std::io::stdout().flush();
        match lines.next_line().await {
            Ok(Some(line)) => {
                if !repl.handle(&line).await {
                    break Ok(());
                }
            }
            Ok(None) => break Ok(()),
            Err(e) => break Err(e.into()),
        }
    };
    repl.session.close().await;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_line("  "), Command::Empty);
        assert_eq!(parse_line("/reset"), Command::Reset);
        assert_eq!(parse_line("/quit"), Command::Quit);
        assert_eq!(parse_line("/exit"), Command::Quit);
        assert_eq!(
            parse_line("/embed a.pdf docs/"),
            Command::Embed(vec![PathBuf::from("a.pdf"), PathBuf::from("docs/")])
        );
        assert_eq!(parse_line("/nope"), Command::Unknown("/nope".to_string()));
    }

    #[test]
    fn plain_line_is_query() {
        assert_eq!(
            parse_line("  what is Section 103?  "),
            Command::Ask("what is Section 103?".to_string())
        );
    }
}
