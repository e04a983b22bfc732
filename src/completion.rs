//! Outbound calls to the chat-completion API
//!
//! The controller talks to the model through the [`CompletionBackend`] trait.
//! [`HttpCompletion`] is the production implementation: one non-streaming
//! `POST {base_url}/chat/completions` per question, with bearer auth.
//!
//! ## Request Flow
//!
//! ```text
//! question + ImagePayload
//!     │
//!     ├─> build_request(): optional system message, then one user message
//!     │   with a text part and an image_url part (data URI)
//!     │
//!     ├─> POST /chat/completions (stream = false)
//!     │
//!     ├─> non-2xx  ──> Error::Api("<status>: <message>")
//!     │
//!     └─> choices[0].message.content ──> answer text
//! ```

use crate::types::{
    ApiErrorBody, CompletionRequest, CompletionResponse, ContentPart, ImagePayload,
    RequestContent, RequestMessage, SessionOptions,
};
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Something that can answer one completion request with text.
///
/// Implementations return low-level errors (`Http`, `Api`, `Json`, `Timeout`);
/// the controller folds them into `CompletionRequestFailed`.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Builds the single-turn request for `question` about `image`.
///
/// Only the current question is sent; earlier turns stay in the transcript.
pub fn build_request(
    options: &SessionOptions,
    question: &str,
    image: &ImagePayload,
) -> CompletionRequest {
    let mut messages = Vec::with_capacity(2);

    if !options.system_prompt().is_empty() {
        messages.push(RequestMessage {
            role: "system".to_string(),
            content: RequestContent::Text(options.system_prompt().to_string()),
        });
    }

    messages.push(RequestMessage {
        role: "user".to_string(),
        content: RequestContent::Parts(vec![
            ContentPart::text(question),
            ContentPart::image(image, options.image_detail()),
        ]),
    });

    CompletionRequest {
        model: options.model().to_string(),
        messages,
        stream: false,
        max_tokens: options.max_tokens(),
        temperature: options.temperature(),
    }
}

/// reqwest-backed completion client
pub struct HttpCompletion {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl std::fmt::Debug for HttpCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCompletion")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"***")
            .finish()
    }
}

impl HttpCompletion {
    /// Creates a client with the timeout from `options`.
    ///
    /// The underlying `reqwest::Client` is reused for every request so
    /// connections are pooled across questions and sessions.
    pub fn new(options: &SessionOptions) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(options.timeout()))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/chat/completions", options.base_url()),
            api_key: options.api_key().to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionBackend for HttpCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout()
                } else {
                    Error::Http(e)
                }
            })?;

        // Catches authentication failures, rate limits and unknown models
        // before we try to read a completion out of the body.
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|e| {
                log::warn!("Failed to read error response body: {}", e);
                "Unknown error (failed to read response body)".to_string()
            });
            let detail = ApiErrorBody::message_from(&body).unwrap_or(body);
            return Err(Error::api(format!("{}: {}", status, detail)));
        }

        let body = response.text().await.map_err(Error::Http)?;
        let parsed: CompletionResponse = serde_json::from_str(&body)?;
        parsed.into_answer()
    }
}
