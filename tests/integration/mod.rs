//! Integration Tests Module
//!
//! End-to-end tests against scripted model and embedding providers:
//! index build and reuse, full chat turns through a `Session`, and
//! conversation export.

// Scripted providers shared by the tests
mod support;

// Index build, persistence and retrieval
mod index_test;

// Full chat turns
mod session_test;

// Conversation export formats
mod export_test;
