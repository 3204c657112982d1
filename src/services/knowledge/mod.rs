//! Knowledge Base
//!
//! The retrieval half of the assistant:
//! - `loader`: corpus folder to page-level documents
//! - `chunker`: overlapping character windows
//! - `embedding_provider` / `embedding_provider_openai`: text to vectors
//! - `hnsw_index`: approximate nearest neighbor graph with disk persistence
//! - `index_builder`: load-or-build of the persisted `SimilarityIndex`
//! - `retriever`: top-k chunk search for a query

pub mod chunker;
pub mod embedding_provider;
pub mod embedding_provider_openai;
pub mod hnsw_index;
pub mod index_builder;
pub mod loader;
pub mod retriever;

pub use chunker::{Chunker, DocumentChunk, RecursiveCharChunker};
pub use embedding_provider::{
    EmbeddingError, EmbeddingProvider, EmbeddingProviderConfig, EmbeddingResult,
};
pub use embedding_provider_openai::OpenAIEmbeddingProvider;
pub use index_builder::{IndexBuilder, IndexManifest, SimilarityIndex};
pub use loader::Document;
pub use retriever::{DocumentRetriever, RetrievedChunk, Retriever};
