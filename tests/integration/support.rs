//! Scripted providers for integration tests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use yoga_gpt::services::knowledge::{EmbeddingProvider, EmbeddingResult};
use yoga_gpt::AppConfig;
use yoga_gpt_llm::{
    LlmError, LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message, ProviderConfig,
    StopReason, ToolCall, ToolDefinition, UsageStats,
};

/// Replays responses in order and keeps every request.
pub struct ScriptedLlm {
    config: ProviderConfig,
    script: Mutex<Vec<LlmResult<LlmResponse>>>,
    pub requests: Mutex<Vec<(Vec<Message>, Option<String>, Vec<ToolDefinition>)>>,
}

impl ScriptedLlm {
    pub fn new(script: Vec<LlmResult<LlmResponse>>) -> Self {
        Self {
            config: ProviderConfig::default(),
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

pub fn text(content: &str) -> LlmResult<LlmResponse> {
    Ok(LlmResponse::text("gpt-4", content))
}

pub fn tool(name: &str, arguments: &str, prompt: u32, completion: u32) -> LlmResult<LlmResponse> {
    Ok(LlmResponse {
        content: None,
        tool_calls: vec![ToolCall {
            id: "call_abc".to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }],
        stop_reason: StopReason::ToolUse,
        usage: Some(UsageStats {
            input_tokens: prompt,
            output_tokens: completion,
        }),
        model: "gpt-4".to_string(),
    })
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn name(&self) -> &'static str {
        "scripted"
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
        self.requests.lock().unwrap().push((messages, system, tools));
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            return Err(LlmError::Other {
                message: "script exhausted".to_string(),
            });
        }
        script.remove(0)
    }
}

/// Bag-of-words embedder over hashed lowercase words.
pub struct WordHashEmbedder {
    calls: AtomicUsize,
}

impl WordHashEmbedder {
    const DIM: usize = 128;

    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn embedded(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn embed(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; Self::DIM];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 2)
        {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(5381u64, |h, b| h.wrapping_mul(33) ^ b as u64);
            v[(hash % (Self::DIM as u64 - 1)) as usize] += 1.0;
        }
        v[Self::DIM - 1] = 0.25;
        v
    }
}

#[async_trait]
impl EmbeddingProvider for WordHashEmbedder {
    async fn embed_documents(&self, documents: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        self.calls.fetch_add(documents.len(), Ordering::SeqCst);
        Ok(documents.iter().map(|d| Self::embed(d)).collect())
    }

    fn dimension(&self) -> usize {
        Self::DIM
    }

    fn max_batch_size(&self) -> usize {
        8
    }

    fn display_name(&self) -> &str {
        "word-hash"
    }
}

/// Config pointing at `corpus` and `index`, with small chunks.
pub fn test_config(corpus: &Path, index: &Path) -> AppConfig {
    AppConfig {
        corpus_dir: corpus.to_path_buf(),
        index_dir: index.to_path_buf(),
        chunk_size: 120,
        chunk_overlap: 20,
        embedding_dimension: WordHashEmbedder::DIM,
        ..Default::default()
    }
}

/// Two small corpus files about standing poses and backbends.
pub fn write_corpus(dir: &Path) {
    std::fs::write(
        dir.join("standing.txt"),
        "Tree pose (Vrksasana) improves balance and strengthens the ankles.\n\n\
         Avoid tree pose with low blood pressure or a recent ankle injury.\n\n\
         Mountain pose teaches alignment and steady breathing.",
    )
    .unwrap();
    std::fs::write(
        dir.join("backbends.md"),
        "# Backbends\n\nCobra pose opens the chest and strengthens the spine.\n\n\
         Bridge pose lifts the hips and stretches the hip flexors.",
    )
    .unwrap();
}
