//! OpenAI Embedding Provider
//!
//! Implements `EmbeddingProvider` for OpenAI's embedding models over reqwest.
//!
//! - Endpoint: `POST https://api.openai.com/v1/embeddings`
//! - Auth: `Authorization: Bearer {api_key}`
//! - Body: `{ model, input: ["text1", ...], dimensions? }`
//! - Response: `{ data: [{ embedding, index }], model, usage }`

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::embedding_provider::{
    EmbeddingError, EmbeddingProvider, EmbeddingProviderConfig, EmbeddingResult,
};
use yoga_gpt_llm::build_http_client;

/// Default OpenAI embedding API endpoint.
const OPENAI_EMBEDDING_API_URL: &str = "https://api.openai.com/v1/embeddings";

/// Maximum batch size supported by the OpenAI embedding API.
const MAX_BATCH_SIZE: usize = 2048;

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: Option<OpenAIErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorDetail {
    message: Option<String>,
}

/// OpenAI embedding provider.
///
/// Works with OpenAI-compatible endpoints via `base_url`.
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    dimension: usize,
    batch_size: usize,
    display_name: String,
}

impl OpenAIEmbeddingProvider {
    /// Create a provider from a validated configuration.
    pub fn new(config: &EmbeddingProviderConfig) -> EmbeddingResult<Self> {
        config.validate()?;

        let client = build_http_client(config.request_timeout_secs.map(Duration::from_secs))
            .map_err(|e| EmbeddingError::InvalidConfig {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone().unwrap_or_default(),
            model: config.model.trim().to_string(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| OPENAI_EMBEDDING_API_URL.to_string()),
            dimension: config.dimension,
            batch_size: config.batch_size.min(MAX_BATCH_SIZE),
            display_name: format!("OpenAI ({})", config.model.trim()),
        })
    }

    fn build_request_body(&self, input: serde_json::Value) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "input": input,
        });
        // Only text-embedding-3-* accepts a reduced output dimension.
        if self.model.contains("text-embedding-3") {
            body["dimensions"] = serde_json::json!(self.dimension);
        }
        body
    }

    async fn post_embeddings(
        &self,
        body: &serde_json::Value,
    ) -> EmbeddingResult<OpenAIEmbeddingResponse> {
        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let body_text = response.text().await.map_err(map_reqwest_error)?;

        if status != 200 {
            return Err(self.map_http_error(status, &body_text));
        }

        serde_json::from_str::<OpenAIEmbeddingResponse>(&body_text).map_err(|e| {
            EmbeddingError::ParseError {
                message: format!("failed to parse embedding response: {}", e),
            }
        })
    }

    fn map_http_error(&self, status: u16, body_text: &str) -> EmbeddingError {
        let error_message = serde_json::from_str::<OpenAIErrorResponse>(body_text)
            .ok()
            .and_then(|r| r.error)
            .and_then(|d| d.message)
            .unwrap_or_else(|| body_text.to_string());

        match status {
            401 | 403 => EmbeddingError::AuthenticationFailed {
                message: error_message,
            },
            429 => EmbeddingError::RateLimited {
                message: error_message,
            },
            400 if error_message.contains("token") || error_message.contains("length") => {
                EmbeddingError::InputTooLong {
                    message: error_message,
                }
            }
            400 => EmbeddingError::InvalidConfig {
                message: format!("bad request: {}", error_message),
            },
            404 => EmbeddingError::ModelNotFound {
                model: format!("'{}': {}", self.model, error_message),
            },
            _ => EmbeddingError::ServerError {
                message: error_message,
                status: Some(status),
            },
        }
    }

    /// Sort the response by input index and check shape.
    fn extract_embeddings(
        &self,
        mut response: OpenAIEmbeddingResponse,
        expected_count: usize,
    ) -> EmbeddingResult<Vec<Vec<f32>>> {
        if response.data.len() != expected_count {
            return Err(EmbeddingError::ParseError {
                message: format!(
                    "expected {} embeddings but OpenAI returned {}",
                    expected_count,
                    response.data.len()
                ),
            });
        }

        response.data.sort_by_key(|d| d.index);

        let vectors: Vec<Vec<f32>> = response.data.into_iter().map(|d| d.embedding).collect();
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.len(),
            });
        }
        Ok(vectors)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> EmbeddingError {
    if err.is_timeout() {
        EmbeddingError::Timeout {
            message: err.to_string(),
        }
    } else {
        EmbeddingError::NetworkError {
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed_documents(&self, documents: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }
        if documents.len() > self.batch_size {
            return Err(EmbeddingError::BatchSizeLimitExceeded {
                requested: documents.len(),
                max_allowed: self.batch_size,
            });
        }

        let body = self.build_request_body(serde_json::json!(documents));
        let response = self.post_embeddings(&body).await?;
        self.extract_embeddings(response, documents.len())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn max_batch_size(&self) -> usize {
        self.batch_size
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }
}
