//! Assistant
//!
//! The per-turn pipeline on top of the knowledge base:
//! - `rewriter`: sharpen the user's question for retrieval
//! - `operations`: tool schemas and the typed `DispatchDecision`
//! - `dispatcher`: one tool-enabled model call, then the chosen operation
//! - `benefits`, `sequence`, `pose_image`: the operations themselves
//! - `composer`: image links and token usage appended to the reply

pub mod benefits;
pub mod composer;
pub mod dispatcher;
pub mod operations;
pub mod pose_image;
pub mod rewriter;
pub mod sequence;

pub use benefits::PoseBenefits;
pub use composer::{compose, ComposeInput};
pub use dispatcher::{Dispatch, FunctionDispatcher, OperationOutput, UNAVAILABLE_MESSAGE};
pub use operations::{DispatchDecision, Operation, ParseError};
pub use pose_image::{pose_image_link, pose_image_url, pose_slug};
pub use rewriter::QueryRewriter;
pub use sequence::create_sequence;
