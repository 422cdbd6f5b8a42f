//! Retriever — top-k document selection behind one trait, with the fallback
//! policy expressed as a fixed-order chain of strategies rather than nested
//! try/catch. `AppState` carries the chain as `Arc<dyn Retrieve>`.

use std::sync::Arc;

use async_trait::async_trait;
use rand::seq::index::sample;
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::encoder::{encode, EncodedDocument};
use crate::index::VectorIndex;
use crate::llm_client::{EmbedText, LlmError};

#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("query embedding failed: {0}")]
    Embedding(#[from] LlmError),

    #[error("embedding service returned no vector for the query")]
    MissingQueryEmbedding,
}

/// One retrieval strategy. The chain treats `Err` and an empty `Ok` the same
/// way: fall through to the next strategy.
#[async_trait]
pub trait Retrieve: Send + Sync {
    async fn retrieve(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<EncodedDocument>, RetrieveError>;
}

/// Primary strategy: embed the query and run a nearest-neighbor search.
/// Ranking order comes from the index; no re-ranking happens here.
pub struct IndexRetriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn EmbedText>,
}

impl IndexRetriever {
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn EmbedText>) -> Self {
        Self { index, embedder }
    }
}

#[async_trait]
impl Retrieve for IndexRetriever {
    async fn retrieve(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<EncodedDocument>, RetrieveError> {
        let embeddings = self.embedder.embed(&[query.to_string()]).await?;
        let query_embedding = embeddings
            .into_iter()
            .next()
            .ok_or(RetrieveError::MissingQueryEmbedding)?;
        Ok(self.index.search(&query_embedding, k))
    }
}

/// Fallback strategy: a uniform sample without replacement of
/// `min(k, catalog size)` rows, re-encoded on the fly. Non-seeded rng, so
/// selection order differs across runs. Never errors: a missing catalog
/// yields an empty result.
pub struct RandomSampleRetriever {
    catalog: Option<Arc<Catalog>>,
}

impl RandomSampleRetriever {
    pub fn new(catalog: Option<Arc<Catalog>>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Retrieve for RandomSampleRetriever {
    async fn retrieve(
        &self,
        _query: &str,
        k: usize,
    ) -> Result<Vec<EncodedDocument>, RetrieveError> {
        let Some(catalog) = &self.catalog else {
            return Ok(Vec::new());
        };
        let n = catalog.records.len();
        if n == 0 {
            return Ok(Vec::new());
        }
        let mut rng = rand::rng();
        let picks = sample(&mut rng, n, k.min(n));
        Ok(picks
            .into_iter()
            .map(|i| encode(i, &catalog.records[i]))
            .collect())
    }
}

/// Tries each strategy in order; an error or an empty result falls through to
/// the next. An exhausted chain returns an empty list, never an error, and
/// callers must treat that as "no matches".
pub struct FallbackChain {
    strategies: Vec<Arc<dyn Retrieve>>,
}

impl FallbackChain {
    pub fn new(strategies: Vec<Arc<dyn Retrieve>>) -> Self {
        Self { strategies }
    }
}

#[async_trait]
impl Retrieve for FallbackChain {
    async fn retrieve(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<EncodedDocument>, RetrieveError> {
        for strategy in &self.strategies {
            match strategy.retrieve(query, k).await {
                Ok(documents) if !documents.is_empty() => return Ok(documents),
                Ok(_) => debug!("retrieval strategy returned no documents, falling through"),
                Err(e) => warn!("retrieval strategy failed, falling through: {e}"),
            }
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AssessmentRecord;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(name: &str) -> AssessmentRecord {
        AssessmentRecord {
            name: name.to_string(),
            url: format!("https://example.com/{name}"),
            remote_testing: "No".to_string(),
            adaptive_support: "No".to_string(),
            assessment_type: "P".to_string(),
            skills: "Personality and Behaviour".to_string(),
            description: format!("{name} description"),
            duration: "".to_string(),
        }
    }

    fn catalog(n: usize) -> Arc<Catalog> {
        Arc::new(Catalog {
            records: (0..n).map(|i| record(&format!("rec{i}"))).collect(),
        })
    }

    /// Always errors, counting invocations.
    struct FailingStrategy {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Retrieve for FailingStrategy {
        async fn retrieve(
            &self,
            _query: &str,
            _k: usize,
        ) -> Result<Vec<EncodedDocument>, RetrieveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(RetrieveError::MissingQueryEmbedding)
        }
    }

    struct FixedStrategy {
        documents: Vec<EncodedDocument>,
    }

    #[async_trait]
    impl Retrieve for FixedStrategy {
        async fn retrieve(
            &self,
            _query: &str,
            _k: usize,
        ) -> Result<Vec<EncodedDocument>, RetrieveError> {
            Ok(self.documents.clone())
        }
    }

    #[tokio::test]
    async fn random_sample_returns_min_k_catalog_size_unique_rows() {
        let retriever = RandomSampleRetriever::new(Some(catalog(5)));
        let documents = retriever.retrieve("anything", 10).await.unwrap();
        assert_eq!(documents.len(), 5);

        let ids: HashSet<&str> = documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids.len(), 5, "sampling must be without replacement");

        // Membership only: selection order is intentionally unseeded.
        let names: HashSet<String> = catalog(5).records.iter().map(|r| r.name.clone()).collect();
        for doc in &documents {
            assert!(names.contains(&doc.metadata.name));
        }
    }

    #[tokio::test]
    async fn random_sample_caps_at_k() {
        let retriever = RandomSampleRetriever::new(Some(catalog(20)));
        let documents = retriever.retrieve("anything", 10).await.unwrap();
        assert_eq!(documents.len(), 10);
    }

    #[tokio::test]
    async fn random_sample_without_catalog_is_empty() {
        let retriever = RandomSampleRetriever::new(None);
        assert!(retriever.retrieve("anything", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn chain_falls_back_past_a_failing_primary() {
        let failing = Arc::new(FailingStrategy {
            calls: AtomicUsize::new(0),
        });
        let chain = FallbackChain::new(vec![
            failing.clone(),
            Arc::new(RandomSampleRetriever::new(Some(catalog(4)))),
        ]);

        let documents = chain.retrieve("rust developer", 10).await.unwrap();
        assert_eq!(documents.len(), 4);
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn chain_falls_back_past_an_empty_primary() {
        let chain = FallbackChain::new(vec![
            Arc::new(FixedStrategy {
                documents: Vec::new(),
            }),
            Arc::new(RandomSampleRetriever::new(Some(catalog(2)))),
        ]);
        assert_eq!(chain.retrieve("q", 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn chain_stops_at_the_first_non_empty_strategy() {
        let fixed = crate::encoder::encode(0, &record("primary"));
        let failing = Arc::new(FailingStrategy {
            calls: AtomicUsize::new(0),
        });
        let chain = FallbackChain::new(vec![
            Arc::new(FixedStrategy {
                documents: vec![fixed.clone()],
            }),
            failing.clone(),
        ]);

        let documents = chain.retrieve("q", 10).await.unwrap();
        assert_eq!(documents, vec![fixed]);
        assert_eq!(failing.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn exhausted_chain_degrades_to_empty_not_error() {
        let chain = FallbackChain::new(vec![
            Arc::new(FailingStrategy {
                calls: AtomicUsize::new(0),
            }),
            Arc::new(RandomSampleRetriever::new(Some(Arc::new(Catalog::default())))),
        ]);
        let result = chain.retrieve("q", 10).await;
        assert!(result.unwrap().is_empty());
    }
}
