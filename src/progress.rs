//! Index build progress reporting.
//!
//! Renders [`IndexEvent`]s during `docqa ingest` and `/embed` so users see
//! how much embedding work is left. Progress is emitted on **stderr** so
//! stdout stays parseable for scripts.

use std::io::Write;

use clap::ValueEnum;
use docqa_core::progress::{IndexEvent, IndexProgress, NoProgress};

/// Human-friendly progress on stderr: "index beginning-1a2b3c4d  embedding  1,024 / 5,000 chunks".
pub struct StderrProgress;

impl IndexProgress for StderrProgress {
    fn report(&self, event: IndexEvent) {
        let line = match &event {
            IndexEvent::Started { collection, chunks } => {
                format!("index {}  started  {} chunks\n", collection, format_number(*chunks))
            }
            IndexEvent::BatchEmbedded { done, total } => format!(
                "index  embedding  {} / {} chunks\n",
                format_number(*done),
                format_number(*total)
            ),
            IndexEvent::Stored { collection, points } => {
                format!("index {}  stored  {} points\n", collection, format_number(*points))
            }
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl IndexProgress for JsonProgress {
    fn report(&self, event: IndexEvent) {
        if let Ok(line) = serde_json::to_string(&event) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn IndexProgress> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
