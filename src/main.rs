//! # docqa CLI
//!
//! The `docqa` binary chunks, indexes and queries documents.
//!
//! ## Usage
//!
//! ```bash
//! docqa --config ./config/docqa.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docqa chunk <paths>` | Extract and chunk documents; print the chunk table |
//! | `docqa ingest <paths>` | Index documents into a new collection generation |
//! | `docqa ask "<query>"` | Answer one question (grounded with `--collection`) |
//! | `docqa chat` | Interactive session with `/embed`, `/reset`, `/history` |
//! | `docqa completions <shell>` | Print a shell completion script |
//!
//! ## Environment
//!
//! `GROQ_API_KEY`, `QDRANT_HOST` and `QDRANT_API_KEY` (names configurable)
//! are read at startup, after loading `.env` from the working directory.
//! `RUST_LOG` controls log output on stderr (default `warn`).

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

use docqa::config::{self, Needs, Secrets};
use docqa::progress::ProgressMode;
use docqa::{ask, chat, ingest};

/// docqa: ask questions about your documents.
#[derive(Parser)]
#[command(
    name = "docqa",
    about = "docqa: ask questions about your documents",
    version,
    long_about = "docqa splits documents into overlapping chunks, embeds them into a vector \
    index, and answers questions by passing the most relevant passages to a chat-completion \
    model. Without an index it answers from the configured subject domain."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/docqa.toml`; built-in defaults are used when
    /// that file does not exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Index progress on stderr. Defaults to `human` on a TTY, else `off`.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract and chunk documents without contacting any service.
    Chunk {
        /// Files or directories (directories are filtered by `[ingest].include_globs`).
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Index documents into a fresh generation of a collection.
    ///
    /// Prints the physical collection name to pass to `ask --collection`.
    Ingest {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Logical collection name (defaults to `[vector_store].collection`).
        #[arg(long)]
        collection: Option<String>,
    },

    /// Answer a single question.
    Ask {
        query: String,

        /// Physical collection to ground the answer in. Without it the
        /// answer is ungrounded.
        #[arg(long)]
        collection: Option<String>,
    },

    /// Start an interactive chat session.
    Chat {
        /// Documents to index before the first prompt.
        #[arg(long = "doc")]
        docs: Vec<PathBuf>,
    },

    /// Print a shell completion script.
    Completions { shell: Shell },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "docqa", &mut std::io::stdout());
        return Ok(());
    }

    let explicit = cli.config.is_some();
    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_PATH));
    let cfg = config::load_config(&config_path, explicit)?;
    let progress = cli
        .progress
        .unwrap_or_else(ProgressMode::default_for_tty)
        .reporter();

    match cli.command {
        Commands::Chunk { paths } => {
            ingest::run_chunk(&cfg, &paths)?;
        }
        Commands::Ingest { paths, collection } => {
            let secrets = Secrets::from_env(
                &cfg,
                Needs {
                    completion: false,
                    index: true,
                },
            )?;
            ingest::run_ingest(&cfg, &secrets, &paths, collection, progress.as_ref()).await?;
        }
        Commands::Ask { query, collection } => {
            let secrets = Secrets::from_env(
                &cfg,
                Needs {
                    completion: true,
                    index: collection.is_some(),
                },
            )?;
            ask::run_ask(&cfg, &secrets, &query, collection).await?;
        }
        Commands::Chat { docs } => {
            let secrets = Secrets::from_env(
                &cfg,
                Needs {
                    completion: true,
                    index: true,
                },
            )?;
            chat::run_chat(&cfg, &secrets, docs, progress.as_ref()).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
