//! Yoga GPT
//!
//! A yoga assistant over a corpus of yoga texts. Each chat turn rewrites the
//! question, lets the model pick one of four operations (pose benefits, pose
//! name extraction, Yoga Journal image link, timed sequence) and composes
//! the answer from retrieved passages.
//!
//! - `models`: configuration and sequence types
//! - `services`: knowledge base, assistant pipeline, sessions and export
//! - `storage`: JSON configuration persistence
//! - `state`: wiring of providers, index and sessions for the CLI

pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use models::sequence::{PoseStep, Sequence, YogaStyle};
pub use models::settings::{AppConfig, SettingsUpdate};
pub use services::session::{Session, TurnOutcome, TurnPhase};
pub use state::AppState;
pub use utils::error::{AppError, AppResult};
pub use yoga_gpt_core::{ConversationTurn, Role};
