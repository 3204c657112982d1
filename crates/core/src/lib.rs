//! Yoga GPT Core
//!
//! Foundational types shared by the Yoga GPT workspace. This crate has no
//! dependency on the LLM layer, the knowledge base or the CLI.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `conversation` - Conversation log types (`Role`, `ConversationTurn`)

pub mod conversation;
pub mod error;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Conversation Log ───────────────────────────────────────────────────
pub use conversation::{ConversationTurn, Role};
