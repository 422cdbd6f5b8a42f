//! LLM Client — the single point of entry for all Ollama calls.
//!
//! ARCHITECTURAL RULE: no other module may talk to the model service
//! directly. The index builder and retriever depend on [`EmbedText`], the
//! recommendation engine on [`GenerateText`]; both are carried as
//! `Arc<dyn …>` so tests can substitute doubles.

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Sampling temperature for ranking calls. Low on purpose: the model is asked
/// for strict JSON and should stay close to deterministic.
pub const GENERATION_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("embedding count mismatch: requested {requested}, got {returned}")]
    EmbeddingCount { requested: usize, returned: usize },
}

/// One non-streaming generation call. No retries: a failed call degrades to
/// the caller's fallback path instead.
#[async_trait]
pub trait GenerateText: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Batch text embedding. Must return exactly one vector per input text.
#[async_trait]
pub trait EmbedText: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Client for a local or remote Ollama server.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    generation_model: String,
    embedding_model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, generation_model: &str, embedding_model: &str) -> Self {
        Self {
            // No request timeout here: generation latency is unbounded by
            // contract. The URL-extraction path sets its own timeout.
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            generation_model: generation_model.to_string(),
            embedding_model: embedding_model.to_string(),
        }
    }

    async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, LlmError> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl GenerateText for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let body = GenerateRequest {
            model: &self.generation_model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: GENERATION_TEMPERATURE,
            },
        };
        let response: GenerateResponse = self.post_json("/api/generate", &body).await?;
        debug!(chars = response.response.len(), "generation call succeeded");
        Ok(response.response)
    }
}

#[async_trait]
impl EmbedText for OllamaClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let body = EmbedRequest {
            model: &self.embedding_model,
            input: texts,
        };
        let response: EmbedResponse = self.post_json("/api/embed", &body).await?;
        if response.embeddings.len() != texts.len() {
            return Err(LlmError::EmbeddingCount {
                requested: texts.len(),
                returned: response.embeddings.len(),
            });
        }
        debug!(vectors = response.embeddings.len(), "embedding call succeeded");
        Ok(response.embeddings)
    }
}
