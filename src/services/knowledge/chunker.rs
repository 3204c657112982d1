//! Document Chunker
//!
//! Defines the `Chunker` trait and `RecursiveCharChunker`, which splits page
//! text into windows of at most `chunk_size` characters, each sharing up to
//! `chunk_overlap` characters with its predecessor. Text is split on the
//! coarsest separator present (paragraph, line, word, character) and the
//! pieces are merged back up to the window size.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let chunker = RecursiveCharChunker::new(500, 200);
//! let chunks = chunker.chunk_documents(&documents);
//! ```

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::loader::Document;

/// Separators tried in order, coarsest first. The empty separator splits
/// into single characters and always applies.
const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// A retrievable unit of text. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub text: String,
    /// File the chunk was cut from.
    pub source: String,
    /// Global ordinal of the chunk within the index.
    pub position: usize,
}

/// Trait for text chunking strategies.
pub trait Chunker: Send + Sync {
    /// Split one text into chunk strings.
    fn split(&self, text: &str) -> Vec<String>;

    /// Chunk every document, numbering chunks globally in document order.
    fn chunk_documents(&self, documents: &[Document]) -> Vec<DocumentChunk> {
        let mut chunks = Vec::new();
        for doc in documents {
            for text in self.split(&doc.content) {
                let position = chunks.len();
                chunks.push(DocumentChunk {
                    text,
                    source: doc.source.clone(),
                    position,
                });
            }
        }
        chunks
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Character-window chunker with recursive separator fallback.
pub struct RecursiveCharChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveCharChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let size = chunk_size.max(1);
        Self {
            chunk_size: size,
            chunk_overlap: chunk_overlap.min(size.saturating_sub(1)),
        }
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let Some(pos) = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
        else {
            return vec![text.to_string()];
        };
        let separator = separators[pos];
        let remaining = &separators[pos + 1..];

        let splits: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        };

        let mut final_chunks = Vec::new();
        let mut fitting: Vec<String> = Vec::new();
        for piece in splits {
            if char_len(&piece) < self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                final_chunks.extend(self.merge_splits(&fitting, separator));
                fitting.clear();
            }
            if remaining.is_empty() {
                final_chunks.push(piece);
            } else {
                final_chunks.extend(self.split_recursive(&piece, remaining));
            }
        }
        if !fitting.is_empty() {
            final_chunks.extend(self.merge_splits(&fitting, separator));
        }
        final_chunks
    }

    /// Greedily join pieces into windows, carrying the tail of each window
    /// (up to `chunk_overlap` characters) into the next one.
    fn merge_splits(&self, splits: &[String], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in splits {
            let len = char_len(piece);
            let joiner = if current.is_empty() { 0 } else { sep_len };

            if total + len + joiner > self.chunk_size && !current.is_empty() {
                if let Some(doc) = join_trimmed(&current, separator) {
                    docs.push(doc);
                }
                while total > self.chunk_overlap
                    || (total > 0
                        && total + len + if current.is_empty() { 0 } else { sep_len }
                            > self.chunk_size)
                {
                    let Some(first) = current.pop_front() else {
                        break;
                    };
                    let joiner = if current.is_empty() { 0 } else { sep_len };
                    total = total.saturating_sub(char_len(first) + joiner);
                }
            }

            total += len + if current.is_empty() { 0 } else { sep_len };
            current.push_back(piece);
        }

        if let Some(doc) = join_trimmed(&current, separator) {
            docs.push(doc);
        }
        docs
    }
}

fn join_trimmed(parts: &VecDeque<&str>, separator: &str) -> Option<String> {
    let joined = parts.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl Chunker for RecursiveCharChunker {
    fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.split_recursive(text, DEFAULT_SEPARATORS)
    }
}
