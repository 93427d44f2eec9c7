//! Core types, configuration, and error handling for critique.
//!
//! This crate provides the shared foundation used by the review crate and the CLI:
//! - [`CritiqueError`] — unified error type using `thiserror`
//! - [`CritiqueConfig`] — configuration loaded from `.critique.toml`
//! - Shared types: [`CodeReview`], [`Finding`], [`Category`], [`Severity`],
//!   [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{ApiConfig, CritiqueConfig, ReviewConfig, API_KEY_ENV};
pub use error::CritiqueError;
pub use types::{Category, CodeReview, Finding, OutputFormat, Severity, RULE_WIDTH};

/// A convenience `Result` type for critique operations.
pub type Result<T> = std::result::Result<T, CritiqueError>;
