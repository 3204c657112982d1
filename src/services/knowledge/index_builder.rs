//! Index Builder
//!
//! Produces the `SimilarityIndex` for a corpus. A persisted index is loaded
//! and returned unchanged when present; otherwise the corpus is ingested,
//! chunked, embedded in batches and indexed, and the result is written to
//! the index directory:
//!
//! - `manifest.json`: build parameters and corpus fingerprint (written last)
//! - `chunks.json`: the chunk table, ordered by position
//! - `embeddings.hnsw.{graph,data}`: the HNSW graph (absent for an empty corpus)

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::chunker::{Chunker, DocumentChunk, RecursiveCharChunker};
use super::embedding_provider::{EmbeddingError, EmbeddingProvider};
use super::hnsw_index::HnswIndex;
use super::loader::{corpus_fingerprint, load_corpus};
use crate::models::settings::AppConfig;
use crate::utils::error::{AppError, AppResult};

const MANIFEST_FILE: &str = "manifest.json";
const CHUNKS_FILE: &str = "chunks.json";
const MANIFEST_VERSION: u32 = 1;

/// Build parameters recorded next to a persisted index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub version: u32,
    /// SHA-256 over corpus file names and sizes at build time.
    pub corpus_fingerprint: String,
    pub embedding_model: String,
    pub dimension: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub chunk_count: usize,
    /// RFC 3339 build timestamp.
    pub built_at: String,
}

/// Chunk table plus vector index. Read-only after build.
#[derive(Debug)]
pub struct SimilarityIndex {
    manifest: IndexManifest,
    chunks: Vec<DocumentChunk>,
    vectors: HnswIndex,
}

impl SimilarityIndex {
    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn chunks(&self) -> &[DocumentChunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.vectors.dimension()
    }

    /// Nearest chunks to an embedded query, most similar first.
    pub fn search(&self, query: &[f32], top_k: usize) -> AppResult<Vec<(DocumentChunk, f32)>> {
        let hits = self.vectors.search(query, top_k)?;
        Ok(hits
            .into_iter()
            .filter_map(|(id, score)| self.chunks.get(id).map(|c| (c.clone(), score)))
            .collect())
    }

    fn save(&self, dir: &Path) -> AppResult<()> {
        fs::create_dir_all(dir)?;
        fs::write(dir.join(CHUNKS_FILE), serde_json::to_string(&self.chunks)?)?;
        self.vectors.save(dir)?;
        fs::write(
            dir.join(MANIFEST_FILE),
            serde_json::to_string_pretty(&self.manifest)?,
        )?;
        Ok(())
    }

    fn load(dir: &Path) -> AppResult<Self> {
        let manifest: IndexManifest =
            serde_json::from_str(&fs::read_to_string(dir.join(MANIFEST_FILE))?)?;
        if manifest.version != MANIFEST_VERSION {
            return Err(AppError::index(format!(
                "unsupported index version {} (expected {})",
                manifest.version, MANIFEST_VERSION
            )));
        }

        let chunks: Vec<DocumentChunk> =
            serde_json::from_str(&fs::read_to_string(dir.join(CHUNKS_FILE))?)?;
        if chunks.len() != manifest.chunk_count {
            return Err(AppError::index(format!(
                "chunk table has {} entries, manifest records {}",
                chunks.len(),
                manifest.chunk_count
            )));
        }

        let vectors = HnswIndex::load(dir, manifest.dimension, manifest.chunk_count)?;
        Ok(Self {
            manifest,
            chunks,
            vectors,
        })
    }
}

/// Loads or builds the similarity index for a corpus folder.
pub struct IndexBuilder {
    index_dir: PathBuf,
    chunk_size: usize,
    chunk_overlap: usize,
    embedding_model: String,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl IndexBuilder {
    pub fn new(config: &AppConfig, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            index_dir: config.index_dir.clone(),
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            embedding_model: config.embedding_model.clone(),
            embedder,
        }
    }

    /// Whether a complete index has been persisted.
    pub fn is_persisted(&self) -> bool {
        self.index_dir.join(MANIFEST_FILE).is_file()
    }

    /// Return the persisted index if present, else build and persist one.
    ///
    /// A persisted index is never rebuilt here, even when the corpus has
    /// changed since; a fingerprint mismatch is only logged.
    pub async fn build(&self, corpus_dir: &Path) -> AppResult<SimilarityIndex> {
        if self.is_persisted() {
            let index = SimilarityIndex::load(&self.index_dir)?;
            self.warn_if_stale(&index, corpus_dir);
            info!(
                dir = %self.index_dir.display(),
                chunks = index.len(),
                "loaded persisted index"
            );
            return Ok(index);
        }
        self.rebuild(corpus_dir).await
    }

    /// Ingest, chunk, embed and persist, replacing any existing index.
    pub async fn rebuild(&self, corpus_dir: &Path) -> AppResult<SimilarityIndex> {
        let fingerprint = corpus_fingerprint(corpus_dir)?;
        let documents = load_corpus(corpus_dir)?;
        let chunker = RecursiveCharChunker::new(self.chunk_size, self.chunk_overlap);
        let chunks = chunker.chunk_documents(&documents);

        info!(
            pages = documents.len(),
            chunks = chunks.len(),
            embedder = %self.embedder.display_name(),
            "building index"
        );

        let vectors = self.embed_chunks(&chunks).await?;
        let dimension = self.embedder.dimension();
        let vectors =
            tokio::task::spawn_blocking(move || HnswIndex::build(dimension, &vectors))
                .await
                .map_err(|e| AppError::internal(format!("index build task failed: {}", e)))??;

        let index = SimilarityIndex {
            manifest: IndexManifest {
                version: MANIFEST_VERSION,
                corpus_fingerprint: fingerprint,
                embedding_model: self.embedding_model.clone(),
                dimension,
                chunk_size: self.chunk_size,
                chunk_overlap: self.chunk_overlap,
                chunk_count: chunks.len(),
                built_at: chrono::Utc::now().to_rfc3339(),
            },
            chunks,
            vectors,
        };

        // Drop a stale manifest first so a failed save never leaves it
        // pointing at half-written files.
        let manifest_path = self.index_dir.join(MANIFEST_FILE);
        if manifest_path.exists() {
            fs::remove_file(&manifest_path)?;
        }
        index.save(&self.index_dir)?;
        info!(dir = %self.index_dir.display(), chunks = index.len(), "index persisted");
        Ok(index)
    }

    async fn embed_chunks(&self, chunks: &[DocumentChunk]) -> AppResult<Vec<Vec<f32>>> {
        let batch_size = self.embedder.max_batch_size().max(1);
        let expected = self.embedder.dimension();
        let mut vectors = Vec::with_capacity(chunks.len());

        for (batch_no, batch) in chunks.chunks(batch_size).enumerate() {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let embedded = self.embedder.embed_documents(&texts).await?;
            if embedded.len() != texts.len() {
                return Err(EmbeddingError::ParseError {
                    message: format!(
                        "expected {} embeddings, got {}",
                        texts.len(),
                        embedded.len()
                    ),
                }
                .into());
            }
            if let Some(bad) = embedded.iter().find(|v| v.len() != expected) {
                return Err(EmbeddingError::DimensionMismatch {
                    expected,
                    actual: bad.len(),
                }
                .into());
            }
            debug!(batch = batch_no, size = texts.len(), "embedded batch");
            vectors.extend(embedded);
        }
        Ok(vectors)
    }

    fn warn_if_stale(&self, index: &SimilarityIndex, corpus_dir: &Path) {
        match corpus_fingerprint(corpus_dir) {
            Ok(current) if current != index.manifest.corpus_fingerprint => warn!(
                corpus = %corpus_dir.display(),
                built_at = %index.manifest.built_at,
                "corpus changed since the index was built; run `index --rebuild` to refresh"
            ),
            Ok(_) => {}
            Err(e) => debug!(error = %e, "could not fingerprint corpus"),
        }
        if index.manifest.embedding_model != self.embedding_model {
            warn!(
                persisted = %index.manifest.embedding_model,
                configured = %self.embedding_model,
                "persisted index used a different embedding model"
            );
        }
    }
}
