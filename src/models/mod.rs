//! Data Models
//!
//! Configuration and sequence types shared across services.

pub mod sequence;
pub mod settings;

pub use sequence::{PoseStep, Sequence, YogaStyle};
pub use settings::{AppConfig, SettingsUpdate};
