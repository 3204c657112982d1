//! Function Dispatcher
//!
//! Makes the single tool-enabled model call of a turn, turns the first tool
//! call into a `DispatchDecision`, and runs the chosen operation.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::benefits::PoseBenefits;
use super::operations::{
    parse_tool_call, tool_definitions, DispatchDecision, Operation, SYSTEM_PROMPT,
};
use super::sequence::create_sequence;
use crate::models::sequence::YogaStyle;
use yoga_gpt_core::{ConversationTurn, Role};
use yoga_gpt_llm::{
    LlmProvider, LlmRequestOptions, LlmResult, Message, ToolCallMode, UsageStats,
};

pub const UNAVAILABLE_MESSAGE: &str =
    "The assistant is temporarily unavailable. Please try again in a moment.";

/// The model's choice for a turn along with its usage envelope.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub decision: DispatchDecision,
    pub usage: Option<UsageStats>,
    pub model: String,
}

/// What an operation produced, before links and usage are appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationOutput {
    pub body: String,
    /// Poses this turn touched, in the order they appeared.
    pub poses: Vec<String>,
}

pub struct FunctionDispatcher {
    llm: Arc<dyn LlmProvider>,
    benefits: PoseBenefits,
}

impl FunctionDispatcher {
    pub fn new(llm: Arc<dyn LlmProvider>, benefits: PoseBenefits) -> Self {
        Self { llm, benefits }
    }

    /// Call the model with the history plus the rewritten query.
    ///
    /// Argument problems never fail the call; they degrade to the
    /// operation's defaults.
    pub async fn decide(
        &self,
        history: &[ConversationTurn],
        query: &str,
        default_style: YogaStyle,
    ) -> LlmResult<Dispatch> {
        let mut messages: Vec<Message> = history
            .iter()
            .map(|turn| match turn.role {
                Role::User => Message::user(turn.content.clone()),
                Role::Assistant => Message::assistant(turn.content.clone()),
            })
            .collect();
        messages.push(Message::user(query));

        let response = self
            .llm
            .send_message(
                messages,
                Some(SYSTEM_PROMPT.to_string()),
                tool_definitions(),
                LlmRequestOptions {
                    tool_call_mode: ToolCallMode::Auto,
                    ..Default::default()
                },
            )
            .await?;

        if response.tool_calls.len() > 1 {
            debug!(
                count = response.tool_calls.len(),
                "model requested several tools; using the first"
            );
        }

        let decision = match response.tool_calls.first() {
            None => DispatchDecision::DirectAnswer {
                content: response.text_content().to_string(),
            },
            Some(call) => match Operation::from_tool_name(&call.name) {
                None => {
                    warn!(tool = %call.name, "model called an unknown tool");
                    DispatchDecision::DirectAnswer {
                        content: response.text_content().to_string(),
                    }
                }
                Some(operation) => parse_tool_call(operation, call, default_style)
                    .unwrap_or_else(|e| {
                        warn!(tool = %call.name, error = %e, "malformed tool arguments");
                        DispatchDecision::with_defaults(operation, default_style)
                    }),
            },
        };

        debug!(operation = decision.operation().as_str(), "dispatched");
        Ok(Dispatch {
            decision,
            usage: response.usage,
            model: response.model,
        })
    }

    /// Run the operation a decision names.
    pub async fn execute(&self, decision: &DispatchDecision) -> OperationOutput {
        let output = match decision {
            DispatchDecision::DirectAnswer { content } => OperationOutput {
                body: content.clone(),
                poses: Vec::new(),
            },
            DispatchDecision::ExtractPoseNames { pose_names }
            | DispatchDecision::GetPoseBenefits { pose_names } => OperationOutput {
                body: self.benefits.lookup(pose_names).await,
                poses: pose_names.clone(),
            },
            DispatchDecision::GetPoseImage { pose_name } => {
                // The image link is never the whole answer.
                let poses: Vec<String> = if pose_name.trim().is_empty() {
                    Vec::new()
                } else {
                    vec![pose_name.clone()]
                };
                OperationOutput {
                    body: self.benefits.lookup(&poses).await,
                    poses,
                }
            }
            DispatchDecision::CreateSequence {
                sequence_name,
                poses,
                style,
            } => {
                let sequence = create_sequence(sequence_name.as_deref(), poses, *style);
                OperationOutput {
                    body: sequence.to_markdown(),
                    poses: poses.clone(),
                }
            }
        };

        info!(
            operation = decision.operation().as_str(),
            poses = output.poses.len(),
            "operation completed"
        );
        output
    }
}
