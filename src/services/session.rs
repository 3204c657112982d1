//! Chat Session
//!
//! Owns the conversation log and runs one turn at a time:
//! rate gate, query rewrite, dispatch, operation, composition.
//!
//! ```text
//! Idle -> RewritingQuery -> Dispatching -> DirectAnswer ----------------> Idle
//!                                       \-> OperationInvoked -> ResultComposed -> Idle
//! ```

use std::sync::Arc;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::assistant::{
    compose, ComposeInput, DispatchDecision, FunctionDispatcher, PoseBenefits, QueryRewriter,
    UNAVAILABLE_MESSAGE,
};
use super::knowledge::retriever::DocumentRetriever;
use super::rate_limit::{TurnGate, RATE_LIMIT_WARNING};
use crate::models::sequence::YogaStyle;
use crate::models::settings::AppConfig;
use yoga_gpt_core::ConversationTurn;
use yoga_gpt_llm::LlmProvider;

/// Where the current turn is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    Idle,
    RewritingQuery,
    Dispatching,
    DirectAnswer,
    OperationInvoked,
    ResultComposed,
}

/// Result of submitting one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The assistant's composed reply, also appended to the history.
    Replied(String),
    /// Dropped by the rate gate; the history is unchanged.
    RateLimited { message: String, retry_in: Duration },
    /// Blank input.
    Ignored,
}

pub struct Session<C: Clock = DefaultClock> {
    rewriter: QueryRewriter,
    dispatcher: FunctionDispatcher,
    gate: TurnGate<C>,
    history: Vec<ConversationTurn>,
    style: YogaStyle,
    show_images: bool,
    phase: TurnPhase,
}

impl Session<DefaultClock> {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        retriever: Arc<dyn DocumentRetriever>,
        config: &AppConfig,
    ) -> Self {
        Self::with_clock(llm, retriever, config, DefaultClock::default())
    }
}

impl<C: Clock> Session<C> {
    pub fn with_clock(
        llm: Arc<dyn LlmProvider>,
        retriever: Arc<dyn DocumentRetriever>,
        config: &AppConfig,
        clock: C,
    ) -> Self {
        let benefits = PoseBenefits::new(retriever, Arc::clone(&llm), config.top_k);
        Self {
            rewriter: QueryRewriter::new(Arc::clone(&llm)),
            dispatcher: FunctionDispatcher::new(llm, benefits),
            gate: TurnGate::with_clock(Duration::from_secs(config.rate_limit_secs), clock),
            history: Vec::new(),
            style: config.default_style,
            show_images: config.show_images,
            phase: TurnPhase::Idle,
        }
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn style(&self) -> YogaStyle {
        self.style
    }

    pub fn set_style(&mut self, style: YogaStyle) {
        self.style = style;
    }

    pub fn show_images(&self) -> bool {
        self.show_images
    }

    pub fn set_show_images(&mut self, show: bool) {
        self.show_images = show;
    }

    /// Forget the conversation. The rate gate keeps its state.
    pub fn clear(&mut self) {
        self.history.clear();
        self.phase = TurnPhase::Idle;
    }

    fn enter(&mut self, phase: TurnPhase) {
        debug!(from = ?self.phase, to = ?phase, "turn phase");
        self.phase = phase;
    }

    /// Run one full turn for `input`.
    pub async fn submit(&mut self, input: &str) -> TurnOutcome {
        let input = input.trim();
        if input.is_empty() {
            return TurnOutcome::Ignored;
        }

        if let Err(retry_in) = self.gate.try_acquire() {
            warn!(retry_in_ms = retry_in.as_millis() as u64, "turn rejected by rate gate");
            return TurnOutcome::RateLimited {
                message: RATE_LIMIT_WARNING.to_string(),
                retry_in,
            };
        }

        self.history.push(ConversationTurn::user(input));
        let reply = self.run_turn(input).await;
        self.history.push(ConversationTurn::assistant(reply.clone()));
        self.enter(TurnPhase::Idle);
        TurnOutcome::Replied(reply)
    }

    async fn run_turn(&mut self, input: &str) -> String {
        self.enter(TurnPhase::RewritingQuery);
        let query = match self.rewriter.rewrite(input).await {
            Ok(query) => query,
            Err(e) => {
                warn!(error = %e, "query rewrite failed; using the raw question");
                input.to_string()
            }
        };

        self.enter(TurnPhase::Dispatching);
        let prior = &self.history[..self.history.len() - 1];
        let dispatch = match self.dispatcher.decide(prior, &query, self.style).await {
            Ok(dispatch) => dispatch,
            Err(e) => {
                warn!(error = %e, "dispatch call failed");
                return UNAVAILABLE_MESSAGE.to_string();
            }
        };

        let phase = match dispatch.decision {
            DispatchDecision::DirectAnswer { .. } => TurnPhase::DirectAnswer,
            _ => TurnPhase::OperationInvoked,
        };
        self.enter(phase);
        let output = self.dispatcher.execute(&dispatch.decision).await;

        let reply = compose(&ComposeInput {
            body: &output.body,
            touched_poses: &output.poses,
            show_images: self.show_images,
            usage: dispatch.usage,
            model: &dispatch.model,
        });
        if phase == TurnPhase::OperationInvoked {
            self.enter(TurnPhase::ResultComposed);
        }

        info!(
            operation = dispatch.decision.operation().as_str(),
            turns = self.history.len() + 1,
            "turn completed"
        );
        reply
    }
}
