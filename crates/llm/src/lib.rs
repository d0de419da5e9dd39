//! Scoring-oracle infrastructure adapter.
//!
//! Implements the [`pipeline::ScoringOracle`] trait over an OpenAI-compatible
//! chat-completions HTTP API (Groq by default). Other providers are added as
//! new implementations in this crate without any change to the `pipeline`
//! crate.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, request formatting, response parsing,
//! and credential handling live here. The [`pipeline`] crate sees only
//! [`pipeline::ScoringOracle`].

pub mod client;
pub mod config;

pub use client::ChatCompletionsOracle;
pub use config::{ApiKey, ConfigurationError, OracleConfig};
