//! Services
//!
//! Business logic for the assistant. The CLI in `main.rs` wires these
//! together; nothing here touches the terminal.

pub mod assistant;
pub mod export;
pub mod knowledge;
pub mod rate_limit;
pub mod session;

#[cfg(test)]
pub mod testing;

pub use export::{export_to_file, ExportFormat};
pub use rate_limit::{TurnGate, RATE_LIMIT_WARNING};
pub use session::{Session, TurnOutcome, TurnPhase};
