//! OpenAI-compatible chat completion client.

use crate::error::LlmError;
use crate::types::*;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Chat completion client.
///
/// The API key is stored using `SecretString` to prevent accidental
/// exposure in logs or debug output.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
    model: String,
}

impl LlmClient {
    /// Create a new client. Without a timeout a request waits for as long as
    /// the server takes to answer.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, LlmError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into(),
            api_key: SecretString::new(api_key.into()),
            model: model.into(),
        })
    }

    /// Get the configured model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a chat completion request and return the first choice's text.
    #[instrument(skip(self, messages), fields(message_count = messages.len()))]
    pub async fn chat(&self, messages: Vec<Message>) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key.expose_secret()))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let chat_response = self.handle_response::<ChatResponse>(response).await?;

        if let Some(usage) = &chat_response.usage {
            debug!(
                "Completion used {} prompt + {} completion tokens",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }

    /// Decode a completion body, or turn a non-2xx status into an `LlmError`.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, LlmError> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            debug!(
                "Response body: {}",
                body.chars().take(200).collect::<String>()
            );
            serde_json::from_str(&body).map_err(LlmError::from)
        } else {
            Err(self.extract_error(response).await)
        }
    }

    /// Map a failed status onto `LlmError`, keeping the body as the message.
    async fn extract_error(&self, response: reqwest::Response) -> LlmError {
        let status = response.status();

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("Rate limit exceeded");
                LlmError::RateLimit
            }
            StatusCode::UNAUTHORIZED => {
                warn!("Authentication failed");
                LlmError::Unauthorized
            }
            _ => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".into());
                LlmError::Api {
                    status: status.as_u16(),
                    message,
                }
            }
        }
    }
}
