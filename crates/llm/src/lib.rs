//! Yoga GPT LLM
//!
//! Provides a provider-neutral interface for chat completions with tool
//! calling, plus the OpenAI implementation used by the assistant:
//! - `types`: messages, tool schemas, responses, usage and errors
//! - `provider`: the `LlmProvider` trait and HTTP error mapping helpers
//! - `openai`: OpenAI chat completions (GPT-4 family)
//! - `http_client`: reqwest client factory with request timeouts

pub mod http_client;
pub mod openai;
pub mod provider;
pub mod types;

// Re-export main types
pub use http_client::build_http_client;
pub use openai::OpenAIProvider;
pub use provider::LlmProvider;
pub use types::*;
