//! Recommendation Engine — retrieval, one ranking call, loose parse, and a
//! deterministic metadata fallback.
//!
//! Reliability contract: nothing past the blank-query check ever surfaces an
//! error. Retrieval failure degrades to an empty document list; a failed or
//! unparseable model call degrades to a fallback list rendered straight from
//! the retrieved documents' metadata. Every call returns a well-formed shape.

pub mod handlers;
pub mod parse;
pub mod prompts;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::encoder::EncodedDocument;
use crate::llm_client::GenerateText;
use crate::retrieval::Retrieve;

/// Upper bound on both retrieval depth and emitted recommendations.
pub const MAX_RECOMMENDATIONS: usize = 10;

/// One ranked, explained recommendation. All fields default so that a model
/// answer with gaps still deserializes; the prompt asks for every field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub remote_testing: String,
    #[serde(default)]
    pub adaptive_support: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default, rename = "type")]
    pub assessment_type: String,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationList {
    pub recommendations: Vec<RecommendationRecord>,
}

/// The engine's only output shape: `{"recommendations": [...]}` or
/// `{"error": "..."}`. Callers never need to know whether the list came from
/// the model or from the fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RecommendResponse {
    Recommendations(RecommendationList),
    Error { error: String },
}

pub struct RecommendationEngine {
    retriever: Arc<dyn Retrieve>,
    llm: Arc<dyn GenerateText>,
}

impl RecommendationEngine {
    pub fn new(retriever: Arc<dyn Retrieve>, llm: Arc<dyn GenerateText>) -> Self {
        Self { retriever, llm }
    }

    pub async fn recommend(&self, query_text: &str) -> RecommendResponse {
        if query_text.trim().is_empty() {
            return RecommendResponse::Error {
                error: "Query text is empty".to_string(),
            };
        }

        // The chain never errors in practice; a bare trait object still may.
        let documents = self
            .retriever
            .retrieve(query_text, MAX_RECOMMENDATIONS)
            .await
            .unwrap_or_default();
        debug!(documents = documents.len(), "retrieval complete");

        let assessments = documents
            .iter()
            .map(|d| d.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = prompts::build_recommend_prompt(&assessments, query_text);

        let raw = match self.llm.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("generation call failed ({e}), using metadata fallback");
                return RecommendResponse::Recommendations(fallback_list(&documents));
            }
        };

        match parse::parse_recommendations(&raw) {
            Ok(list) => RecommendResponse::Recommendations(list),
            Err(e) => {
                warn!("model output unusable ({e}), using metadata fallback");
                RecommendResponse::Recommendations(fallback_list(&documents))
            }
        }
    }
}

/// Deterministic substitute built straight from retrieved metadata, keeping
/// retrieval order.
pub fn fallback_list(documents: &[EncodedDocument]) -> RecommendationList {
    let recommendations = documents
        .iter()
        .take(MAX_RECOMMENDATIONS)
        .map(|doc| {
            let m = &doc.metadata;
            let skills = if m.skills.trim().is_empty() {
                "various areas"
            } else {
                m.skills.as_str()
            };
            RecommendationRecord {
                name: or_default(&m.name, "Unknown Assessment"),
                url: or_default(&m.url, "#"),
                remote_testing: or_default(&m.remote_testing, "No"),
                adaptive_support: or_default(&m.adaptive_support, "No"),
                duration: or_default(&m.duration, "Unknown"),
                assessment_type: or_default(&m.assessment_type, "Unknown"),
                explanation: format!(
                    "This assessment matches your query for skills in {skills}."
                ),
            }
        })
        .collect();
    RecommendationList { recommendations }
}

fn or_default(value: &str, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AssessmentRecord;
    use crate::encoder::encode;
    use crate::llm_client::LlmError;
    use crate::retrieval::RetrieveError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(name: &str) -> AssessmentRecord {
        AssessmentRecord {
            name: name.to_string(),
            url: format!("https://example.com/{name}"),
            remote_testing: "Yes".to_string(),
            adaptive_support: "No".to_string(),
            assessment_type: "K".to_string(),
            skills: "Knowledge and Skills".to_string(),
            description: format!("{name} description"),
            duration: "30".to_string(),
        }
    }

    struct FixedRetriever {
        documents: Vec<EncodedDocument>,
    }

    #[async_trait]
    impl Retrieve for FixedRetriever {
        async fn retrieve(
            &self,
            _query: &str,
            k: usize,
        ) -> Result<Vec<EncodedDocument>, RetrieveError> {
            Ok(self.documents.iter().take(k).cloned().collect())
        }
    }

    struct CannedModel {
        output: Result<String, ()>,
        calls: AtomicUsize,
    }

    impl CannedModel {
        fn ok(output: &str) -> Self {
            Self {
                output: Ok(output.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                output: Err(()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl GenerateText for CannedModel {
        async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.output {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(LlmError::Api {
                    status: 500,
                    message: "model down".to_string(),
                }),
            }
        }
    }

    fn engine_with(
        documents: Vec<EncodedDocument>,
        model: Arc<CannedModel>,
    ) -> RecommendationEngine {
        RecommendationEngine::new(Arc::new(FixedRetriever { documents }), model)
    }

    fn documents(n: usize) -> Vec<EncodedDocument> {
        (0..n).map(|i| encode(i, &record(&format!("rec{i}")))).collect()
    }

    #[tokio::test]
    async fn blank_query_short_circuits_before_the_model() {
        let model = Arc::new(CannedModel::ok("{}"));
        let engine = engine_with(documents(3), model.clone());

        let response = engine.recommend("   \n\t ").await;
        assert_eq!(
            response,
            RecommendResponse::Error {
                error: "Query text is empty".to_string()
            }
        );
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn valid_model_json_is_returned_as_is() {
        let output = r##"```json
{"recommendations":[{"name":"A","url":"#","remote_testing":"Yes","adaptive_support":"No","duration":"30","type":"K","explanation":"fits"}]}
```"##;
        let engine = engine_with(documents(3), Arc::new(CannedModel::ok(output)));

        let RecommendResponse::Recommendations(list) = engine.recommend("java developer").await
        else {
            panic!("expected recommendations");
        };
        assert_eq!(list.recommendations.len(), 1);
        assert_eq!(list.recommendations[0].name, "A");
        assert_eq!(list.recommendations[0].explanation, "fits");
    }

    #[tokio::test]
    async fn unparseable_output_falls_back_to_retrieved_metadata() {
        let docs = documents(3);
        let engine = engine_with(docs.clone(), Arc::new(CannedModel::ok("total nonsense")));

        let RecommendResponse::Recommendations(list) = engine.recommend("java developer").await
        else {
            panic!("expected recommendations");
        };
        assert_eq!(list.recommendations.len(), 3);
        for (rec, doc) in list.recommendations.iter().zip(&docs) {
            assert_eq!(rec.name, doc.metadata.name);
            assert_eq!(rec.url, doc.metadata.url);
            assert_eq!(rec.assessment_type, doc.metadata.assessment_type);
            assert_eq!(
                rec.explanation,
                "This assessment matches your query for skills in Knowledge and Skills."
            );
        }
    }

    #[tokio::test]
    async fn missing_recommendations_key_also_falls_back() {
        let engine = engine_with(
            documents(2),
            Arc::new(CannedModel::ok(r#"{"answers": []}"#)),
        );
        let RecommendResponse::Recommendations(list) = engine.recommend("q").await else {
            panic!("expected recommendations");
        };
        assert_eq!(list.recommendations.len(), 2);
    }

    #[tokio::test]
    async fn model_failure_falls_back_instead_of_erroring() {
        let engine = engine_with(documents(2), Arc::new(CannedModel::failing()));
        let RecommendResponse::Recommendations(list) = engine.recommend("q").await else {
            panic!("expected recommendations");
        };
        assert_eq!(list.recommendations.len(), 2);
    }

    #[tokio::test]
    async fn empty_retrieval_still_returns_a_well_formed_shape() {
        let engine = engine_with(Vec::new(), Arc::new(CannedModel::ok("garbage")));
        let RecommendResponse::Recommendations(list) = engine.recommend("q").await else {
            panic!("expected recommendations");
        };
        assert!(list.recommendations.is_empty());
    }

    #[tokio::test]
    async fn fallback_caps_at_ten_and_fills_blank_fields() {
        let mut docs = documents(12);
        docs[0].metadata.skills = String::new();
        docs[0].metadata.duration = String::new();
        docs[0].metadata.assessment_type = String::new();

        let list = fallback_list(&docs);
        assert_eq!(list.recommendations.len(), MAX_RECOMMENDATIONS);
        assert_eq!(list.recommendations[0].duration, "Unknown");
        assert_eq!(list.recommendations[0].assessment_type, "Unknown");
        assert_eq!(
            list.recommendations[0].explanation,
            "This assessment matches your query for skills in various areas."
        );
    }

    #[test]
    fn response_shapes_serialize_to_the_wire_contract() {
        let error = RecommendResponse::Error {
            error: "Query text is empty".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            serde_json::json!({"error": "Query text is empty"})
        );

        let list = RecommendResponse::Recommendations(RecommendationList {
            recommendations: vec![RecommendationRecord {
                name: "A".to_string(),
                assessment_type: "K".to_string(),
                ..Default::default()
            }],
        });
        let value = serde_json::to_value(&list).unwrap();
        assert_eq!(value["recommendations"][0]["type"], "K");
        assert_eq!(value["recommendations"][0]["name"], "A");
    }
}
