//! Document Loader
//!
//! Reads the corpus folder into page-level documents. PDFs are split into
//! pages on the form feeds `pdf-extract` emits; `.txt` and `.md` files are a
//! single page each. Files are visited in name order so chunk positions are
//! stable across rebuilds.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::utils::error::{AppError, AppResult};

/// File extensions picked up from the corpus folder.
const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt", "md"];

/// One page of source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Page text.
    pub content: String,
    /// Originating file path, as found in the corpus folder.
    pub source: String,
    /// Zero-based page number within the source file.
    pub page: usize,
}

impl Document {
    pub fn new(content: impl Into<String>, source: impl Into<String>, page: usize) -> Self {
        Self {
            content: content.into(),
            source: source.into(),
            page,
        }
    }
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// List supported corpus files, sorted by path.
pub fn list_corpus_files(dir: &Path) -> AppResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(AppError::not_found(format!(
            "corpus folder {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_supported(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Split extracted PDF text into non-blank pages.
fn split_pdf_pages(text: &str) -> Vec<(usize, &str)> {
    text.split('\x0c')
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .collect()
}

/// Load a single file into page documents.
pub fn load_file(path: &Path) -> AppResult<Vec<Document>> {
    let source = path.display().to_string();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let docs = if ext == "pdf" {
        let text = pdf_extract::extract_text(path)
            .map_err(|e| AppError::document(format!("failed to read {}: {}", source, e)))?;
        split_pdf_pages(&text)
            .into_iter()
            .map(|(page, content)| Document::new(content.trim(), source.clone(), page))
            .collect()
    } else {
        let text = fs::read_to_string(path)?;
        if text.trim().is_empty() {
            Vec::new()
        } else {
            vec![Document::new(text.trim(), source, 0)]
        }
    };

    debug!(file = %path.display(), pages = docs.len(), "loaded corpus file");
    Ok(docs)
}

/// Load every supported file in `dir`, in path order.
pub fn load_corpus(dir: &Path) -> AppResult<Vec<Document>> {
    let files = list_corpus_files(dir)?;
    let mut docs = Vec::new();
    for file in &files {
        docs.extend(load_file(file)?);
    }
    info!(
        dir = %dir.display(),
        files = files.len(),
        pages = docs.len(),
        "corpus loaded"
    );
    Ok(docs)
}

/// SHA-256 over the sorted file names and sizes of the corpus.
///
/// Used to notice that a persisted index was built from a different corpus.
pub fn corpus_fingerprint(dir: &Path) -> AppResult<String> {
    let mut hasher = Sha256::new();
    for file in list_corpus_files(dir)? {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let size = fs::metadata(&file)?.len();
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        hasher.update(size.to_le_bytes());
    }
    Ok(format!("{:x}", hasher.finalize()))
}
