//! Index Build Integration Tests
//!
//! Build, reload and rebuild against a real corpus folder and the on-disk
//! HNSW files.

use std::sync::Arc;

use tempfile::tempdir;
use yoga_gpt::services::knowledge::{IndexBuilder, Retriever};

use crate::support::{test_config, write_corpus, WordHashEmbedder};

#[tokio::test]
async fn test_persisted_index_is_reused_without_embedding() {
    let corpus = tempdir().unwrap();
    let index_dir = tempdir().unwrap();
    write_corpus(corpus.path());
    let config = test_config(corpus.path(), index_dir.path());

    let first_embedder = Arc::new(WordHashEmbedder::new());
    let first = IndexBuilder::new(&config, first_embedder.clone())
        .build(corpus.path())
        .await
        .unwrap();
    assert!(first_embedder.embedded() > 0);
    for file in ["manifest.json", "chunks.json", "embeddings.hnsw.graph", "embeddings.hnsw.data"] {
        assert!(index_dir.path().join(file).exists(), "missing {}", file);
    }

    let second_embedder = Arc::new(WordHashEmbedder::new());
    let second = IndexBuilder::new(&config, second_embedder.clone())
        .build(corpus.path())
        .await
        .unwrap();
    assert_eq!(second_embedder.embedded(), 0);
    assert_eq!(second.chunks(), first.chunks());
    assert_eq!(second.manifest(), first.manifest());
}

#[tokio::test]
async fn test_rebuild_picks_up_new_files() {
    let corpus = tempdir().unwrap();
    let index_dir = tempdir().unwrap();
    write_corpus(corpus.path());
    let config = test_config(corpus.path(), index_dir.path());
    let embedder = Arc::new(WordHashEmbedder::new());
    let builder = IndexBuilder::new(&config, embedder.clone());

    let before = builder.build(corpus.path()).await.unwrap();
    std::fs::write(
        corpus.path().join("seated.txt"),
        "Lotus pose calms the mind and opens the hips.",
    )
    .unwrap();

    let stale = builder.build(corpus.path()).await.unwrap();
    assert_eq!(stale.len(), before.len());

    let rebuilt = builder.rebuild(corpus.path()).await.unwrap();
    assert_eq!(rebuilt.len(), before.len() + 1);
    assert!(rebuilt
        .chunks()
        .iter()
        .any(|c| c.source.ends_with("seated.txt")));
    assert_ne!(
        rebuilt.manifest().corpus_fingerprint,
        before.manifest().corpus_fingerprint
    );
}

#[tokio::test]
async fn test_retrieval_over_reloaded_index() {
    let corpus = tempdir().unwrap();
    let index_dir = tempdir().unwrap();
    write_corpus(corpus.path());
    let config = test_config(corpus.path(), index_dir.path());

    IndexBuilder::new(&config, Arc::new(WordHashEmbedder::new()))
        .build(corpus.path())
        .await
        .unwrap();

    let embedder = Arc::new(WordHashEmbedder::new());
    let index = IndexBuilder::new(&config, embedder.clone())
        .build(corpus.path())
        .await
        .unwrap();
    let retriever = Retriever::new(Arc::new(index), embedder);

    let hits = retriever.query("cobra pose chest spine", 2).await.unwrap();
    assert!(hits.len() <= 2);
    assert!(hits[0].chunk.text.contains("Cobra"));
    assert!(hits[0].chunk.source.ends_with("backbends.md"));
}

#[tokio::test]
async fn test_empty_corpus_retrieves_nothing() {
    let corpus = tempdir().unwrap();
    let index_dir = tempdir().unwrap();
    let config = test_config(corpus.path(), index_dir.path());
    let embedder = Arc::new(WordHashEmbedder::new());

    let index = IndexBuilder::new(&config, embedder.clone())
        .build(corpus.path())
        .await
        .unwrap();
    assert!(index.is_empty());

    let retriever = Retriever::new(Arc::new(index), embedder.clone());
    assert!(retriever.query("tree pose", 3).await.unwrap().is_empty());
    assert_eq!(embedder.embedded(), 0);
}
