//! Scripted oracle shared by the workflow integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use pipeline::{OracleError, OracleRequest, ScoringOracle};

/// Replies with a fixed response per stage and records every request.
///
/// Stages without a scripted reply receive [`OracleError::Transport`].
#[derive(Default)]
pub struct ScriptedOracle {
    replies: HashMap<String, Result<String, OracleError>>,
    calls: Mutex<Vec<OracleRequest>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, stage: &str, text: &str) -> Self {
        self.replies.insert(stage.to_string(), Ok(text.to_string()));
        self
    }

    pub fn fail(mut self, stage: &str, error: OracleError) -> Self {
        self.replies.insert(stage.to_string(), Err(error));
        self
    }

    /// Stages called so far, in call order.
    pub fn called(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.stage.to_string())
            .collect()
    }

    /// Prompts sent so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(OracleRequest::prompt).collect()
    }
}

#[async_trait]
impl ScoringOracle for ScriptedOracle {
    async fn evaluate(&self, request: &OracleRequest) -> Result<String, OracleError> {
        self.calls.lock().unwrap().push(request.clone());
        self.replies
            .get(request.stage.as_str())
            .cloned()
            .unwrap_or_else(|| Err(OracleError::Transport(format!("no script for {}", request.stage))))
    }
}
