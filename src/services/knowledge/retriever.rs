//! Retriever
//!
//! Top-k chunk search for a query string. The `DocumentRetriever` trait is
//! the seam the assistant depends on, so lookups can be exercised without a
//! built index.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::chunker::DocumentChunk;
use super::embedding_provider::EmbeddingProvider;
use super::index_builder::SimilarityIndex;
use crate::utils::error::{AppError, AppResult};

/// A chunk with its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Anything that can answer "which chunks are closest to this text".
#[async_trait]
pub trait DocumentRetriever: Send + Sync {
    /// At most `k` chunks, most similar first. Sources are not deduplicated.
    async fn retrieve(&self, query: &str, k: usize) -> AppResult<Vec<RetrievedChunk>>;
}

/// Retriever over a built `SimilarityIndex`.
pub struct Retriever {
    index: Arc<SimilarityIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    min_similarity: Option<f32>,
}

impl Retriever {
    pub fn new(index: Arc<SimilarityIndex>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            index,
            embedder,
            min_similarity: None,
        }
    }

    /// Drop chunks scoring below `floor`.
    pub fn with_min_similarity(mut self, floor: Option<f32>) -> Self {
        self.min_similarity = floor;
        self
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    pub async fn query(&self, text: &str, k: usize) -> AppResult<Vec<RetrievedChunk>> {
        if self.index.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_vec = self.embedder.embed_query(text).await?;
        let index = Arc::clone(&self.index);
        let hits = tokio::task::spawn_blocking(move || index.search(&query_vec, k))
            .await
            .map_err(|e| AppError::internal(format!("search task failed: {}", e)))??;

        let results: Vec<RetrievedChunk> = hits
            .into_iter()
            .filter(|(_, score)| self.min_similarity.map_or(true, |floor| *score >= floor))
            .map(|(chunk, score)| RetrievedChunk { chunk, score })
            .collect();

        debug!(query = %text, k, hits = results.len(), "retrieved chunks");
        Ok(results)
    }
}

#[async_trait]
impl DocumentRetriever for Retriever {
    async fn retrieve(&self, query: &str, k: usize) -> AppResult<Vec<RetrievedChunk>> {
        self.query(query, k).await
    }
}
