//! Test doubles shared by the service unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::services::knowledge::chunker::DocumentChunk;
use crate::services::knowledge::embedding_provider::{EmbeddingProvider, EmbeddingResult};
use crate::services::knowledge::retriever::{DocumentRetriever, RetrievedChunk};
use crate::utils::error::{AppError, AppResult};
use yoga_gpt_llm::{
    LlmError, LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message, ProviderConfig,
    StopReason, ToolCall, ToolDefinition, UsageStats,
};

// ============================================================================
// Mock LLM Provider
// ============================================================================

/// One captured `send_message` call.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub system: Option<String>,
    pub tools: Vec<ToolDefinition>,
}

/// Returns predefined responses in order and records every request.
pub struct MockLlmProvider {
    config: ProviderConfig,
    responses: Mutex<Vec<LlmResult<LlmResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockLlmProvider {
    pub fn new(responses: Vec<LlmResult<LlmResponse>>) -> Self {
        Self {
            config: ProviderConfig {
                model: "gpt-4".to_string(),
                ..Default::default()
            },
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// Plain text reply.
pub fn text_response(text: &str) -> LlmResult<LlmResponse> {
    Ok(LlmResponse::text("gpt-4", text))
}

/// Reply that calls one tool with raw JSON arguments and reports usage.
pub fn tool_response(name: &str, arguments: &str, usage: Option<(u32, u32)>) -> LlmResult<LlmResponse> {
    Ok(LlmResponse {
        content: None,
        tool_calls: vec![ToolCall {
            id: "call_0".to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }],
        stop_reason: StopReason::ToolUse,
        usage: usage.map(|(input_tokens, output_tokens)| UsageStats {
            input_tokens,
            output_tokens,
        }),
        model: "gpt-4".to_string(),
    })
}

pub fn timeout_error() -> LlmResult<LlmResponse> {
    Err(LlmError::Timeout {
        message: "mock timeout".to_string(),
    })
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        tools: Vec<ToolDefinition>,
        _request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        self.requests.lock().unwrap().push(RecordedRequest {
            messages,
            system,
            tools,
        });
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Err(LlmError::Other {
                message: "No more mock responses available".to_string(),
            })
        } else {
            responses.remove(0)
        }
    }
}

// ============================================================================
// Counting Embedder
// ============================================================================

/// Hashed bag-of-words embedder that counts how many texts it embedded.
///
/// The last component is a constant bias so no vector is all zeros.
pub struct CountingEmbedder {
    dimension: usize,
    embedded: AtomicUsize,
}

impl CountingEmbedder {
    pub fn new() -> Self {
        Self {
            dimension: 256,
            embedded: AtomicUsize::new(0),
        }
    }

    pub fn embedded_count(&self) -> usize {
        self.embedded.load(Ordering::SeqCst)
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let buckets = self.dimension - 1;
        let mut v = vec![0.0f32; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            // FNV-1a
            let mut hash: u64 = 0xcbf29ce484222325;
            for b in word.to_lowercase().bytes() {
                hash ^= b as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            v[(hash % buckets as u64) as usize] += 1.0;
        }
        v[buckets] = 0.5;
        v
    }
}

#[async_trait]
impl EmbeddingProvider for CountingEmbedder {
    async fn embed_documents(&self, documents: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        self.embedded.fetch_add(documents.len(), Ordering::SeqCst);
        Ok(documents.iter().map(|d| self.vectorize(d)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn max_batch_size(&self) -> usize {
        2
    }

    fn display_name(&self) -> &str {
        "counting"
    }
}

// ============================================================================
// Static Retriever
// ============================================================================

/// Serves canned chunks keyed by a substring of the query.
#[derive(Default)]
pub struct StaticRetriever {
    entries: Vec<(String, Vec<RetrievedChunk>)>,
    failing: Vec<String>,
    calls: AtomicUsize,
}

impl StaticRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queries containing `key` return chunks with the given `(text, source)`.
    pub fn with(mut self, key: &str, chunks: &[(&str, &str)]) -> Self {
        let chunks = chunks
            .iter()
            .enumerate()
            .map(|(i, (text, source))| RetrievedChunk {
                chunk: DocumentChunk {
                    text: text.to_string(),
                    source: source.to_string(),
                    position: i,
                },
                score: 1.0 - i as f32 * 0.1,
            })
            .collect();
        self.entries.push((key.to_string(), chunks));
        self
    }

    /// Queries containing `key` fail.
    pub fn failing_on(mut self, key: &str) -> Self {
        self.failing.push(key.to_string());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentRetriever for StaticRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> AppResult<Vec<RetrievedChunk>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.iter().any(|key| query.contains(key.as_str())) {
            return Err(AppError::index("mock retrieval failure"));
        }
        Ok(self
            .entries
            .iter()
            .find(|(key, _)| query.contains(key.as_str()))
            .map(|(_, chunks)| chunks.iter().take(k).cloned().collect())
            .unwrap_or_default())
    }
}
