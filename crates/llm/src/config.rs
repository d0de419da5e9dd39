//! Oracle endpoint and credential configuration.
//!
//! Read once at process start from the environment. The pipeline crates never
//! see any of it.

use std::time::Duration;

use thiserror::Error;

/// Variable holding the API key. Required.
pub const API_KEY_VAR: &str = "GROQ_API_KEY";
/// Variable overriding the chat-completions endpoint.
pub const ENDPOINT_VAR: &str = "GRADEFLOW_ORACLE_ENDPOINT";
/// Variable overriding the model name.
pub const MODEL_VAR: &str = "GRADEFLOW_ORACLE_MODEL";
/// Variable overriding the request timeout, in whole seconds.
pub const TIMEOUT_VAR: &str = "GRADEFLOW_ORACLE_TIMEOUT_SECS";

/// Groq's OpenAI-compatible chat-completions endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
/// Model used when [`MODEL_VAR`] is unset.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
/// Request timeout used when [`TIMEOUT_VAR`] is unset.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration problems detected at startup. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A required variable is unset or empty.
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    /// A variable is set to something unusable.
    #[error("environment variable {var} has invalid value '{value}': {reason}")]
    Invalid {
        /// The variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// An API key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a raw key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the raw key for use in a request header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Everything needed to reach an OpenAI-compatible chat-completions API.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleConfig {
    /// Full URL of the chat-completions endpoint.
    pub endpoint: String,
    /// Bearer credential sent with every request.
    pub api_key: ApiKey,
    /// Model name placed in each request body.
    pub model: String,
    /// Sampling temperature. Zero keeps replies as repeatable as the
    /// provider allows.
    pub temperature: f32,
    /// Upper bound on one request, connection included.
    pub timeout: Duration,
}

impl OracleConfig {
    /// Creates a configuration with default endpoint, model, and timeout.
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`OracleConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// - [`ConfigurationError::Missing`] if [`API_KEY_VAR`] is unset.
    /// - [`ConfigurationError::Invalid`] if [`TIMEOUT_VAR`] is not a positive
    ///   integer.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let api_key = get(API_KEY_VAR).ok_or(ConfigurationError::Missing(API_KEY_VAR))?;
        let mut config = Self::new(ApiKey::new(api_key));

        if let Some(endpoint) = get(ENDPOINT_VAR) {
            config.endpoint = endpoint;
        }
        if let Some(model) = get(MODEL_VAR) {
            config.model = model;
        }
        if let Some(raw) = get(TIMEOUT_VAR) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| e.to_string())
                .and_then(|secs| {
                    if secs == 0 {
                        Err("must be greater than zero".to_string())
                    } else {
                        Ok(secs)
                    }
                })
                .map_err(|reason| ConfigurationError::Invalid {
                    var: TIMEOUT_VAR,
                    value: raw.clone(),
                    reason,
                })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Returns a copy using `model` instead of the configured model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}
