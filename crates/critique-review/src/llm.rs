use std::time::Duration;

use async_trait::async_trait;
use critique_core::{ApiConfig, CritiqueError};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// HTTP status the Messages API uses when it is over capacity.
const STATUS_OVERLOADED: u16 = 529;

/// Anything that turns a review prompt into review text.
///
/// [`LlmClient`] is the production implementation; tests substitute stubs.
#[async_trait]
pub trait ReviewBackend: Send + Sync {
    /// Send one prompt and return the model's answer.
    async fn review(&self, prompt: &str) -> Result<String, CritiqueError>;
}

/// A message in the request conversation.
///
/// # Examples
///
/// ```
/// use critique_review::llm::{ChatMessage, Role};
///
/// let msg = ChatMessage {
///     role: Role::User,
///     content: "Review this code".into(),
/// };
/// assert!(matches!(msg.role, Role::User));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
}

/// Role in the conversation.
///
/// # Examples
///
/// ```
/// use critique_review::llm::Role;
///
/// assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

/// Client for a Messages-style completion endpoint.
///
/// Issues exactly one request per [`ReviewBackend::review`] call and never
/// retries; see [`crate::pacing::with_retry`] for that.
///
/// # Examples
///
/// ```
/// use critique_core::ApiConfig;
/// use critique_review::llm::LlmClient;
///
/// let config = ApiConfig {
///     api_key: Some("test-key".into()),
///     ..ApiConfig::default()
/// };
/// let client = LlmClient::new(&config).unwrap();
/// assert_eq!(client.model(), config.model);
/// ```
pub struct LlmClient {
    client: reqwest::Client,
    config: ApiConfig,
    api_key: String,
}

impl LlmClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CritiqueError::Config`] if the API key is missing or blank,
    /// or if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, CritiqueError> {
        let api_key = config.require_api_key()?.to_string();
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| CritiqueError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
            api_key,
        })
    }

    /// Return the model name from the configuration.
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl ReviewBackend for LlmClient {
    async fn review(&self, prompt: &str) -> Result<String, CritiqueError> {
        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: vec![ChatMessage {
                role: Role::User,
                content: prompt.to_string(),
            }],
        };

        debug!(url = %self.config.url, model = %self.config.model, "sending review request");
        let response = self
            .client
            .post(&self.config.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.config.version)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body_text = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    debug!(status = status.as_u16(), error = %e, "could not read error body");
                    String::new()
                }
            };
            error!(status = status.as_u16(), body = %body_text, "API call failed");
            return Err(status_error(status.as_u16(), body_text));
        }

        let body_text = response.text().await.map_err(transport_error)?;
        if body_text.is_empty() {
            return Err(CritiqueError::EmptyResponse);
        }
        extract_text(&body_text)
    }
}

fn transport_error(e: reqwest::Error) -> CritiqueError {
    let what = if e.is_timeout() {
        "request timed out"
    } else if e.is_connect() {
        "could not connect to the API"
    } else {
        "request failed"
    };
    CritiqueError::Network(format!("{what}: {e}"))
}

/// Map a non-success HTTP status to its error.
fn status_error(status: u16, body: String) -> CritiqueError {
    match status {
        401 => CritiqueError::Authentication,
        429 => CritiqueError::RateLimited,
        STATUS_OVERLOADED => CritiqueError::ServiceOverloaded,
        _ => CritiqueError::Api { status, body },
    }
}

/// Pull the first content block's text out of a success body.
fn extract_text(body: &str) -> Result<String, CritiqueError> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        error!(body = %body, "failed to parse API response");
        CritiqueError::MalformedResponse(format!("invalid JSON: {e}"))
    })?;

    let blocks = value
        .get("content")
        .and_then(|c| c.as_array())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| CritiqueError::MalformedResponse("response missing content".into()))?;

    blocks[0]
        .get("text")
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            CritiqueError::MalformedResponse(format!(
                "first content block has no text: {}",
                blocks[0]
            ))
        })
}
