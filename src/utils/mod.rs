//! Utilities
//!
//! Error types, path helpers and text formatting.

pub mod error;
pub mod paths;
pub mod text;
