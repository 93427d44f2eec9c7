//! Review orchestration for critique.
//!
//! Provides the review pipeline: file discovery, content loading, prompt
//! construction, the Messages API client, request pacing, and batch
//! orchestration with per-file failure isolation.

pub mod discovery;
pub mod llm;
pub mod loader;
pub mod pacing;
pub mod pipeline;
pub mod prompt;
