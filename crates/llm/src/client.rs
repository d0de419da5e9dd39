//! [`ScoringOracle`] over an OpenAI-compatible chat-completions API.

use async_trait::async_trait;
use pipeline::{OracleError, OracleRequest, ScoringOracle};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::OracleConfig;

/// Sends each oracle request as a single-message chat completion.
///
/// One HTTP round-trip per [`ScoringOracle::evaluate`] call; no retries. The
/// configured timeout bounds every request, so a stalled provider surfaces as
/// [`OracleError::Timeout`].
#[derive(Debug, Clone)]
pub struct ChatCompletionsOracle {
    client: reqwest::Client,
    config: OracleConfig,
}

impl ChatCompletionsOracle {
    /// Builds the HTTP client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Transport`] if the TLS backend cannot be
    /// initialised.
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OracleError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// The active configuration.
    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    fn headers(&self) -> Result<HeaderMap, OracleError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut bearer =
            HeaderValue::from_str(&format!("Bearer {}", self.config.api_key.expose()))
                .map_err(|e| OracleError::Transport(format!("invalid API key header: {e}")))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
        Ok(headers)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

fn request_body<'a>(model: &'a str, temperature: f32, prompt: &'a str) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content: prompt,
        }],
        temperature,
    }
}

/// Extracts the first choice's text from a chat-completions response body.
fn parse_completion(body: &str) -> Result<String, OracleError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| OracleError::MalformedResponse(e.to_string()))?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| OracleError::MalformedResponse("missing choices".to_string()))?;
    match choice.message.content {
        Some(content) if !content.is_empty() => Ok(content),
        _ => Err(OracleError::EmptyResponse),
    }
}

fn transport_error(error: reqwest::Error) -> OracleError {
    if error.is_timeout() {
        OracleError::Timeout
    } else {
        OracleError::Transport(error.to_string())
    }
}

#[async_trait]
impl ScoringOracle for ChatCompletionsOracle {
    async fn evaluate(&self, request: &OracleRequest) -> Result<String, OracleError> {
        let prompt = request.prompt();
        let body = request_body(&self.config.model, self.config.temperature, &prompt);

        debug!(
            stage = %request.stage,
            model = %self.config.model,
            prompt_chars = prompt.len(),
            "sending oracle request"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await.map_err(transport_error)?;
        parse_completion(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ApiKey;

    #[test]
    fn request_body_has_one_user_message() {
        let body = request_body("llama-3.3-70b-versatile", 0.0, "Rate this.");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "llama-3.3-70b-versatile",
                "messages": [{ "role": "user", "content": "Rate this." }],
                "temperature": 0.0
            })
        );
    }

    #[test]
    fn parses_first_choice() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Score: 0.7\nGood."}},{"index":1,"message":{"role":"assistant","content":"ignored"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "Score: 0.7\nGood.");
    }

    #[test]
    fn missing_choices_is_malformed() {
        assert!(matches!(
            parse_completion(r#"{"choices":[]}"#),
            Err(OracleError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_completion("not json"),
            Err(OracleError::MalformedResponse(_))
        ));
    }

    #[test]
    fn null_or_empty_content_is_empty_response() {
        assert_eq!(
            parse_completion(r#"{"choices":[{"message":{"content":null}}]}"#),
            Err(OracleError::EmptyResponse)
        );
        assert_eq!(
            parse_completion(r#"{"choices":[{"message":{"content":""}}]}"#),
            Err(OracleError::EmptyResponse)
        );
    }

    #[test]
    fn authorization_header_is_marked_sensitive() {
        let oracle = ChatCompletionsOracle::new(OracleConfig::new(ApiKey::new("gsk-123"))).unwrap();
        let headers = oracle.headers().unwrap();
        let auth = headers.get(AUTHORIZATION).unwrap();
        assert!(auth.is_sensitive());
        assert_eq!(auth.to_str().unwrap(), "Bearer gsk-123");
        assert!(!format!("{oracle:?}").contains("gsk-123"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let mut config = OracleConfig::new(ApiKey::new("k"));
        config.endpoint = "http://127.0.0.1:9/v1/chat/completions".to_string();
        config.timeout = std::time::Duration::from_secs(2);
        let oracle = ChatCompletionsOracle::new(config).unwrap();
        let request = OracleRequest::new(
            pipeline::NodeId::from_static("check_relevance"),
            "doc",
            "{document}",
        );

        let err = oracle.evaluate(&request).await.unwrap_err();

        assert!(matches!(err, OracleError::Transport(_) | OracleError::Timeout));
    }
}
