//! HNSW Vector Index
//!
//! Wraps the `hnsw_rs` crate to provide approximate nearest neighbor search
//! over chunk embeddings under cosine distance. The index is built once from
//! a full set of vectors and is read-only afterwards; data IDs are chunk
//! positions.
//!
//! ## Persistence
//!
//! The graph is persisted as two files in the index directory:
//! - `<index_dir>/embeddings.hnsw.graph`
//! - `<index_dir>/embeddings.hnsw.data`
//!
//! An index over zero vectors writes no files and loads as empty.

use hnsw_rs::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::utils::error::{AppError, AppResult};

/// HNSW tuning parameters.
const MAX_NB_CONNECTION: usize = 24;
const MAX_LAYER: usize = 16;
const EF_CONSTRUCTION: usize = 200;
const EF_SEARCH: usize = 64;

/// Basename used for the persisted HNSW files.
pub const HNSW_BASENAME: &str = "embeddings";

/// Newtype wrapper so the HNSW can be shared across threads.
///
/// When loaded from disk `hnsw_rs` returns an `Hnsw` borrowing from its
/// `HnswIo`; the `HnswIo` is leaked once per load to get `'static`.
struct HnswInner {
    hnsw: Hnsw<'static, f32, DistCosine>,
}

// SAFETY: Hnsw<'static, f32, DistCosine> uses Arc/RwLock-based internal
// storage and is never mutated after construction here.
unsafe impl Send for HnswInner {}
unsafe impl Sync for HnswInner {}

/// Read-only approximate nearest neighbor index.
pub struct HnswIndex {
    dimension: usize,
    count: usize,
    inner: Option<HnswInner>,
}

impl std::fmt::Debug for HnswIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HnswIndex")
            .field("dimension", &self.dimension)
            .field("count", &self.count)
            .finish()
    }
}

impl HnswIndex {
    /// An index with no vectors.
    pub fn empty(dimension: usize) -> Self {
        Self {
            dimension,
            count: 0,
            inner: None,
        }
    }

    /// Build an index where vector `i` gets data ID `i`.
    pub fn build(dimension: usize, vectors: &[Vec<f32>]) -> AppResult<Self> {
        if vectors.is_empty() {
            return Ok(Self::empty(dimension));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(AppError::index(format!(
                "vector has dimension {}, index expects {}",
                bad.len(),
                dimension
            )));
        }

        let hnsw = Hnsw::<f32, DistCosine>::new(
            MAX_NB_CONNECTION,
            vectors.len(),
            MAX_LAYER,
            EF_CONSTRUCTION,
            DistCosine,
        );
        for (id, vector) in vectors.iter().enumerate() {
            hnsw.insert_slice((vector.as_slice(), id));
        }

        debug!(points = vectors.len(), dimension, "HNSW graph built");
        Ok(Self {
            dimension,
            count: vectors.len(),
            inner: Some(HnswInner { hnsw }),
        })
    }

    /// Load a persisted index. `expected_count` comes from the manifest;
    /// zero means nothing was dumped.
    pub fn load(dir: &Path, dimension: usize, expected_count: usize) -> AppResult<Self> {
        if expected_count == 0 {
            return Ok(Self::empty(dimension));
        }

        let graph_file = dir.join(format!("{}.hnsw.graph", HNSW_BASENAME));
        let data_file = dir.join(format!("{}.hnsw.data", HNSW_BASENAME));
        let non_empty = |p: &Path| std::fs::metadata(p).map(|m| m.len() > 0).unwrap_or(false);
        if !non_empty(&graph_file) || !non_empty(&data_file) {
            return Err(AppError::index(format!(
                "HNSW files missing or empty in {}",
                dir.display()
            )));
        }

        let dir_owned = dir.to_path_buf();
        // hnsw_rs can panic on corrupt data instead of returning an error.
        let load_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let io = Box::leak(Box::new(HnswIo::new(&dir_owned, HNSW_BASENAME)));
            let result: Result<Hnsw<'static, f32, DistCosine>, _> =
                io.load_hnsw_with_dist(DistCosine);
            result
        }));

        match load_result {
            Ok(Ok(hnsw)) => {
                let count = hnsw.get_nb_point();
                if count != expected_count {
                    warn!(
                        dir = %dir.display(),
                        loaded = count,
                        expected = expected_count,
                        "HNSW point count differs from manifest"
                    );
                }
                info!(dir = %dir.display(), points = count, "HNSW loaded from disk");
                Ok(Self {
                    dimension,
                    count,
                    inner: Some(HnswInner { hnsw }),
                })
            }
            Ok(Err(e)) => Err(AppError::index(format!("HNSW load failed: {}", e))),
            Err(_panic) => Err(AppError::index(format!(
                "HNSW files in {} are corrupt; rebuild the index",
                dir.display()
            ))),
        }
    }

    /// Persist the graph. Does nothing for an empty index.
    pub fn save(&self, dir: &Path) -> AppResult<()> {
        let Some(inner) = &self.inner else {
            return Ok(());
        };
        std::fs::create_dir_all(dir)?;
        inner
            .hnsw
            .file_dump(dir, HNSW_BASENAME)
            .map_err(|e| AppError::index(format!("HNSW file_dump failed: {}", e)))?;
        Ok(())
    }

    /// Up to `top_k` nearest neighbors of `query` as `(data_id, similarity)`,
    /// most similar first. Similarity is `1 - cosine distance`.
    pub fn search(&self, query: &[f32], top_k: usize) -> AppResult<Vec<(usize, f32)>> {
        let Some(inner) = &self.inner else {
            return Ok(Vec::new());
        };
        if top_k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(AppError::index(format!(
                "query has dimension {}, index expects {}",
                query.len(),
                self.dimension
            )));
        }

        let ef = EF_SEARCH.max(top_k * 2);
        let mut results: Vec<(usize, f32)> = inner
            .hnsw
            .search(query, top_k, ef)
            .into_iter()
            .map(|n| (n.d_id, 1.0 - n.distance))
            .collect();
        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);
        Ok(results)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}
