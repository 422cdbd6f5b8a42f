//! Vector Index — a persisted nearest-neighbor store over encoded documents.
//!
//! Bootstrap rule: existence of the storage file alone decides load-vs-build.
//! An existing index is trusted as-is; no consistency check against the
//! current catalog is performed. A failed build leaves an empty marker file
//! behind so the next start loads (and degrades) instead of re-running a
//! failing build on every boot.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::catalog::Catalog;
use crate::encoder::{encode, EncodedDocument};
use crate::llm_client::{EmbedText, LlmError};

/// Documents per embedding request. Bounds peak payload size per call to the
/// embedding service.
const EMBED_BATCH_SIZE: usize = 50;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("embedding service error: {0}")]
    Embedding(#[from] LlmError),

    #[error("index I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    embedding: Vec<f32>,
    document: EncodedDocument,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Builds the index from the catalog if `path` does not exist, otherwise
    /// loads it. Never fails: every failure path degrades to an empty index
    /// and logs what happened.
    pub async fn build_or_load(
        catalog: &Catalog,
        path: &Path,
        embedder: &dyn EmbedText,
    ) -> VectorIndex {
        if path.exists() {
            return match Self::load(path) {
                Ok(index) => {
                    info!(
                        documents = index.len(),
                        "loaded existing vector index from {}",
                        path.display()
                    );
                    index
                }
                Err(e) => {
                    warn!(
                        "vector index at {} is unreadable ({e}); serving without one",
                        path.display()
                    );
                    VectorIndex::default()
                }
            };
        }

        match Self::build(catalog, embedder).await {
            Ok(index) => {
                match index.persist(path) {
                    Ok(()) => info!(
                        documents = index.len(),
                        "vector index built and persisted to {}",
                        path.display()
                    ),
                    Err(e) => error!("failed to persist vector index: {e}"),
                }
                index
            }
            Err(e) => {
                error!("vector index build failed: {e}");
                // Marker so later boots take the load path.
                if !path.exists() {
                    if let Err(io) = fs::write(path, b"") {
                        error!("failed to write index marker file: {io}");
                    }
                }
                VectorIndex::default()
            }
        }
    }

    async fn build(catalog: &Catalog, embedder: &dyn EmbedText) -> Result<VectorIndex, IndexError> {
        let documents: Vec<EncodedDocument> = catalog
            .records
            .iter()
            .enumerate()
            .map(|(i, record)| encode(i, record))
            .collect();

        let mut entries = Vec::with_capacity(documents.len());
        for chunk in documents.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = chunk.iter().map(|d| d.text.clone()).collect();
            let embeddings = embedder.embed(&texts).await?;
            for (document, embedding) in chunk.iter().cloned().zip(embeddings) {
                entries.push(IndexEntry {
                    embedding,
                    document,
                });
            }
        }
        Ok(VectorIndex { entries })
    }

    fn load(path: &Path) -> Result<VectorIndex, IndexError> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn persist(&self, path: &Path) -> Result<(), IndexError> {
        fs::write(path, serde_json::to_vec(self)?)?;
        Ok(())
    }

    /// Top-k documents by cosine similarity to `query`, most similar first.
    /// Ties keep insertion order (the sort is stable).
    pub fn search(&self, query: &[f32], k: usize) -> Vec<EncodedDocument> {
        let mut scored: Vec<(f32, &EncodedDocument)> = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(query, &entry.embedding), &entry.document))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(k)
            .map(|(_, document)| document.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
