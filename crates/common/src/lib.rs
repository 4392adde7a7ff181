//! Shared utilities, configuration, and error handling for CodeJam
//!
//! This crate provides common functionality used across the CodeJam backend:
//! - Configuration loaded from the environment
//! - Error types and their HTTP rendering
//! - Session token generation and comparison
//! - Validated request extraction

pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod extractors;
pub mod state;

pub use config::{Config, SessionStoreKind};
pub use crypto::{generate_token, tokens_match};
pub use db::RepositoryError;
pub use error::{Error, Result};
pub use extractors::ValidatedJson;
pub use state::StateError;
