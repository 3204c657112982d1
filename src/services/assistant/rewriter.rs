//! Query Rewriter
//!
//! Asks the model to restate the user's question so it retrieves better
//! from the yoga knowledge base.

use std::sync::Arc;

use tracing::debug;

use yoga_gpt_llm::{LlmProvider, LlmRequestOptions, LlmResult, Message, ToolCallMode};

const REWRITE_TEMPLATE: &str =
    "Rewrite the user question to be more specific and clear for yoga-related knowledge base: ";

pub struct QueryRewriter {
    llm: Arc<dyn LlmProvider>,
}

impl QueryRewriter {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// One model call, no retries. A blank reply yields the raw question.
    pub async fn rewrite(&self, raw: &str) -> LlmResult<String> {
        let prompt = format!("{}{}", REWRITE_TEMPLATE, raw);
        let response = self
            .llm
            .send_message(
                vec![Message::user(prompt)],
                None,
                Vec::new(),
                LlmRequestOptions {
                    tool_call_mode: ToolCallMode::None,
                    ..Default::default()
                },
            )
            .await?;

        let rewritten = response.text_content().trim();
        if rewritten.is_empty() {
            return Ok(raw.to_string());
        }
        debug!(original = %raw, rewritten = %rewritten, "query rewritten");
        Ok(rewritten.to_string())
    }
}
