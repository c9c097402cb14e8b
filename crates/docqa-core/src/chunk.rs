//! Separator-aware sliding-window text chunker.
//!
//! Splits extracted text into overlapping [`Chunk`]s of at most
//! `chunk_size` characters. A window ends just after the last separator
//! (newline by default) that falls inside it; when none does, the window
//! is hard-cut at the size boundary.
//!
//! # Algorithm
//!
//! 1. The window starts at `start` and may extend to `start + chunk_size`.
//! 2. If the window reaches the end of the text, it becomes the final chunk.
//! 3. Otherwise it ends just after the last separator inside it, provided
//!    that leaves more than `chunk_overlap` characters; else it is hard-cut.
//! 4. The next window starts `chunk_overlap` characters before that end,
//!    moved back to just after a separator if one lies within the
//!    preceding `chunk_overlap` characters.
//!
//! Sizes are counted in `char`s, so multi-byte text is never split inside
//! a code point.
//!
//! # Example
//!
//! ```rust
//! use docqa_core::chunk::{chunk_text, ChunkConfig};
//!
//! let chunks = chunk_text("A\nB\nC", &ChunkConfig::default()).unwrap();
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].text, "A\nB\nC");
//! ```

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::Chunk;

/// Chunking parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChunkConfig {
    /// Maximum characters per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks. Must be below `chunk_size`.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Preferred break point. An empty separator means hard cuts only.
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    200
}
fn default_separator() -> String {
    "\n".to_string()
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            separator: default_separator(),
        }
    }
}

impl ChunkConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            ..Self::default()
        }
    }

    /// Reject configurations that cannot make forward progress.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be > 0".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Split `text` into overlapping chunks.
///
/// Returns an empty vector for empty input. Chunk indices are contiguous
/// starting at 0, and each chunk's `start`/`end` are character offsets
/// into `text`.
///
/// # Errors
///
/// [`Error::Config`] when `chunk_size` is zero or `chunk_overlap >= chunk_size`.
pub fn chunk_text(text: &str, config: &ChunkConfig) -> Result<Vec<Chunk>> {
    config.validate()?;

    let chars: Vec<char> = text.chars().collect();
    let sep: Vec<char> = config.separator.chars().collect();
    let total = chars.len();
    let size = config.chunk_size;
    let overlap = config.chunk_overlap;

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut prev_end = 0usize;

    while start < total {
        let hard_end = (start + size).min(total);
        let end = if hard_end == total {
            total
        } else {
            // A separator break must leave room for the next window to advance.
            last_break_in(&chars, &sep, start + overlap + 1, hard_end).unwrap_or(hard_end)
        };

        chunks.push(Chunk {
            index: chunks.len(),
            text: chars[start..end].iter().collect(),
            start,
            end,
            overlap: prev_end.saturating_sub(start),
        });

        if end == total {
            break;
        }

        let nominal = end - overlap;
        let next = if overlap == 0 {
            end
        } else {
            last_break_in(&chars, &sep, (nominal.saturating_sub(overlap)).max(start + 1), nominal)
                .unwrap_or(nominal)
        };

        prev_end = end;
        start = next;
    }

    Ok(chunks)
}

/// Find the largest break position `p` in `lo..=hi` such that the
/// separator ends exactly at `p`.
fn last_break_in(chars: &[char], sep: &[char], lo: usize, hi: usize) -> Option<usize> {
    if sep.is_empty() || lo > hi {
        return None;
    }
    (lo.max(sep.len())..=hi)
        .rev()
        .find(|&p| chars[p - sep.len()..p] == *sep)
}
