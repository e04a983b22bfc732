//! Core types for PictoQuery

use crate::{Error, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Options for configuring a chat controller
#[derive(Clone)]
pub struct SessionOptions {
    system_prompt: String,
    model: String,
    base_url: String,
    api_key: String,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    timeout: u64,
    image_detail: ImageDetail,
}

impl fmt::Debug for SessionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionOptions")
            .field("system_prompt", &self.system_prompt)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .field("image_detail", &self.image_detail)
            .finish()
    }
}

impl SessionOptions {
    /// Create a new builder for SessionOptions
    pub fn builder() -> SessionOptionsBuilder {
        SessionOptionsBuilder::default()
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Model identifier sent with every completion request (e.g. "gpt-4o")
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The API credential. Never log or display this value.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Completion length cap; `None` leaves it to the provider
    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    /// Sampling temperature; `None` leaves it to the provider
    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    /// Request timeout in seconds
    pub fn timeout(&self) -> u64 {
        self.timeout
    }

    pub fn image_detail(&self) -> ImageDetail {
        self.image_detail
    }
}

/// Builder for SessionOptions
#[derive(Default)]
pub struct SessionOptionsBuilder {
    system_prompt: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    api_key: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    timeout: Option<u64>,
    image_detail: Option<ImageDetail>,
}

impl fmt::Debug for SessionOptionsBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionOptionsBuilder")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl SessionOptionsBuilder {
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn image_detail(mut self, detail: ImageDetail) -> Self {
        self.image_detail = Some(detail);
        self
    }

    pub fn build(self) -> Result<SessionOptions> {
        let model = self
            .model
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| Error::config("model is required"))?;

        let base_url = self
            .base_url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| Error::config("base_url is required"))?;

        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::config("api_key is required"))?;

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(Error::config(format!(
                    "temperature must be between 0.0 and 2.0, got {}",
                    temperature
                )));
            }
        }

        let timeout = self.timeout.unwrap_or(60);
        if timeout == 0 {
            return Err(Error::config("timeout must be at least one second"));
        }

        Ok(SessionOptions {
            system_prompt: self.system_prompt.unwrap_or_default(),
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout,
            image_detail: self.image_detail.unwrap_or_default(),
        })
    }
}

/// Who produced a transcript message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// One turn of the transcript. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: MessageRole,
    content: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: text.into(),
        }
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    /// Raw, unescaped content. Use the render module before showing it as markup.
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Accepted image types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageMime {
    Jpeg,
    Png,
    Webp,
}

impl ImageMime {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageMime::Jpeg => "image/jpeg",
            ImageMime::Png => "image/png",
            ImageMime::Webp => "image/webp",
        }
    }

    /// Resolve a file extension (without the dot), case-insensitively
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(ImageMime::Jpeg),
            "png" => Ok(ImageMime::Png),
            "webp" => Ok(ImageMime::Webp),
            other => Err(Error::unsupported_image_type(format!(".{}", other))),
        }
    }

    /// Resolve the type of an image file from its extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::unsupported_image_type(path.display().to_string()))?;
        Self::from_extension(ext)
    }
}

impl FromStr for ImageMime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Ok(ImageMime::Jpeg),
            "image/png" => Ok(ImageMime::Png),
            "image/webp" => Ok(ImageMime::Webp),
            _ => Err(Error::unsupported_image_type(s.trim())),
        }
    }
}

impl fmt::Display for ImageMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolution hint forwarded with the image
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    Low,
    High,
    #[default]
    Auto,
}

impl ImageDetail {
    pub fn is_auto(&self) -> bool {
        matches!(self, ImageDetail::Auto)
    }
}

impl FromStr for ImageDetail {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(ImageDetail::Low),
            "high" => Ok(ImageDetail::High),
            "auto" => Ok(ImageDetail::Auto),
            other => Err(Error::invalid_input(format!(
                "unknown image detail '{}' (expected low, high or auto)",
                other
            ))),
        }
    }
}

/// The currently uploaded image, base64-encoded
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    data: String,
    mime: ImageMime,
}

impl ImagePayload {
    /// Encode raw image bytes. Empty input is rejected; there is no size limit.
    pub fn from_bytes(bytes: &[u8], mime: ImageMime) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::invalid_input("uploaded image is empty"));
        }
        Ok(Self {
            data: STANDARD.encode(bytes),
            mime,
        })
    }

    /// Base64 payload without the data URI prefix
    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn mime(&self) -> ImageMime {
        self.mime
    }

    pub fn encoded_len(&self) -> usize {
        self.data.len()
    }

    /// `data:<mime>;base64,<payload>`
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime.as_str(), self.data)
    }
}

// Payloads can be megabytes; keep them out of debug output and logs.
impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("mime", &self.mime)
            .field("encoded_len", &self.data.len())
            .finish()
    }
}

/// Chat completions request body
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<RequestMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// A message in the request's `messages` array
#[derive(Debug, Clone, Serialize)]
pub struct RequestMessage {
    pub role: String,
    pub content: RequestContent,
}

/// Either a plain string or an array of typed parts
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RequestContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// One part of a multimodal message
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn image(payload: &ImagePayload, detail: ImageDetail) -> Self {
        ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: payload.data_uri(),
                detail,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    pub url: String,
    #[serde(skip_serializing_if = "ImageDetail::is_auto")]
    pub detail: ImageDetail,
}

/// Chat completions response body; only the fields we read
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionChoice {
    pub message: ChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionResponse {
    /// Text of the first choice. Any other shape is an API error.
    ///
    /// A choice that stopped on the token limit (`finish_reason: "length"`)
    /// is still returned, with a warning logged.
    pub fn into_answer(self) -> Result<String> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::api("response contained no choices"))?;

        if choice.finish_reason.as_deref() == Some("length") {
            log::warn!("Answer was cut off by the token limit (finish_reason: length)");
        }

        choice
            .message
            .content
            .ok_or_else(|| Error::api("first choice has no text content"))
    }

    /// True when the first choice stopped on the token limit
    pub fn is_truncated(&self) -> bool {
        self.choices
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            == Some("length")
    }
}

/// `{"error": {"message": "..."}}` body returned with non-2xx statuses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
}

impl ApiErrorBody {
    /// The API's own message, if the body has that shape
    pub fn message_from(body: &str) -> Option<String> {
        serde_json::from_str::<ApiErrorBody>(body)
            .ok()
            .map(|b| b.error.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> SessionOptionsBuilder {
        SessionOptions::builder()
            .model("gpt-4o")
            .base_url("https://api.openai.com/v1")
            .api_key("sk-test")
    }

    #[test]
    fn test_session_options_builder() {
        let options = options()
            .system_prompt("Describe images")
            .max_tokens(300)
            .temperature(0.2)
            .timeout(30)
            .image_detail(ImageDetail::High)
            .build()
            .unwrap();

        assert_eq!(options.system_prompt(), "Describe images");
        assert_eq!(options.model(), "gpt-4o");
        assert_eq!(options.base_url(), "https://api.openai.com/v1");
        assert_eq!(options.api_key(), "sk-test");
        assert_eq!(options.max_tokens(), Some(300));
        assert_eq!(options.temperature(), Some(0.2));
        assert_eq!(options.timeout(), 30);
        assert_eq!(options.image_detail(), ImageDetail::High);
    }

    #[test]
    fn test_session_options_builder_defaults() {
        let options = options().build().unwrap();

        assert_eq!(options.system_prompt(), "");
        assert_eq!(options.max_tokens(), None);
        assert_eq!(options.temperature(), None);
        assert_eq!(options.timeout(), 60);
        assert_eq!(options.image_detail(), ImageDetail::Auto);
    }

    #[test]
    fn test_session_options_builder_missing_required() {
        let result = SessionOptions::builder()
            .base_url("http://localhost:1234/v1")
            .api_key("k")
            .build();
        assert!(matches!(result, Err(Error::Config(_))));

        let result = SessionOptions::builder().model("m").api_key("k").build();
        assert!(matches!(result, Err(Error::Config(_))));

        let result = SessionOptions::builder()
            .model("m")
            .base_url("http://localhost:1234/v1")
            .api_key("   ")
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_session_options_rejects_bad_ranges() {
        assert!(options().temperature(2.5).build().is_err());
        assert!(options().timeout(0).build().is_err());
    }

    #[test]
    fn test_session_options_trims_trailing_slash() {
        let options = options().base_url("http://localhost:1234/v1/").build().unwrap();
        assert_eq!(options.base_url(), "http://localhost:1234/v1");
    }

    #[test]
    fn test_session_options_debug_redacts_api_key() {
        let options = options().api_key("sk-very-secret").build().unwrap();
        let debug = format!("{:?}", options);
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("***"));

        let builder = SessionOptions::builder().api_key("sk-very-secret");
        assert!(!format!("{:?}", builder).contains("sk-very-secret"));
    }

    #[test]
    fn test_message_constructors() {
        let user = Message::user("What is this?");
        assert_eq!(user.role(), MessageRole::User);
        assert_eq!(user.content(), "What is this?");

        let assistant = Message::assistant("A cat.");
        assert_eq!(assistant.role(), MessageRole::Assistant);
        assert_eq!(assistant.content(), "A cat.");
    }

    #[test]
    fn test_message_role_serialization() {
        assert_eq!(
            serde_json::to_string(&MessageRole::User).unwrap(),
            "\"user\""
        );
        assert_eq!(
            serde_json::to_string(&MessageRole::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn test_image_mime_parse() {
        assert_eq!("image/png".parse::<ImageMime>().unwrap(), ImageMime::Png);
        assert_eq!(" IMAGE/JPEG ".parse::<ImageMime>().unwrap(), ImageMime::Jpeg);
        assert_eq!("image/jpg".parse::<ImageMime>().unwrap(), ImageMime::Jpeg);
        assert_eq!("image/webp".parse::<ImageMime>().unwrap(), ImageMime::Webp);

        for rejected in ["image/gif", "text/html", "", "image/png;charset=utf-8"] {
            assert!(
                matches!(
                    rejected.parse::<ImageMime>(),
                    Err(Error::UnsupportedImageType(_))
                ),
                "should reject {:?}",
                rejected
            );
        }
    }

    #[test]
    fn test_image_mime_from_path() {
        assert_eq!(
            ImageMime::from_path(Path::new("photos/cat.JPG")).unwrap(),
            ImageMime::Jpeg
        );
        assert_eq!(
            ImageMime::from_path(Path::new("a.webp")).unwrap(),
            ImageMime::Webp
        );
        assert!(ImageMime::from_path(Path::new("notes.txt")).is_err());
        assert!(ImageMime::from_path(Path::new("no_extension")).is_err());
    }

    #[test]
    fn test_image_payload_encoding() {
        let payload = ImagePayload::from_bytes(b"\x89PNG", ImageMime::Png).unwrap();
        assert_eq!(payload.data(), "iVBORw==");
        assert_eq!(payload.data_uri(), "data:image/png;base64,iVBORw==");
        assert_eq!(payload.encoded_len(), 8);
    }

    #[test]
    fn test_image_payload_rejects_empty() {
        let result = ImagePayload::from_bytes(&[], ImageMime::Jpeg);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_image_payload_debug_omits_data() {
        let payload = ImagePayload::from_bytes(&[7u8; 300], ImageMime::Webp).unwrap();
        let debug = format!("{:?}", payload);
        assert!(!debug.contains(payload.data()));
        assert!(debug.contains("encoded_len"));
    }

    #[test]
    fn test_content_part_serialization() {
        let payload = ImagePayload::from_bytes(b"abc", ImageMime::Jpeg).unwrap();

        let auto = serde_json::to_value(ContentPart::image(&payload, ImageDetail::Auto)).unwrap();
        assert_eq!(
            auto,
            serde_json::json!({
                "type": "image_url",
                "image_url": {"url": "data:image/jpeg;base64,YWJj"}
            })
        );

        let high = serde_json::to_value(ContentPart::image(&payload, ImageDetail::High)).unwrap();
        assert_eq!(high["image_url"]["detail"], "high");

        let text = serde_json::to_value(ContentPart::text("hi")).unwrap();
        assert_eq!(text, serde_json::json!({"type": "text", "text": "hi"}));
    }

    #[test]
    fn test_completion_response_first_choice() {
        let json = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "A red pixel."}, "finish_reason": "stop"},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}, "finish_reason": "stop"}
            ]
        }"#;
        let response: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.into_answer().unwrap(), "A red pixel.");
    }

    #[test]
    fn test_completion_response_length_cutoff_still_answers() {
        let json = r#"{"choices": [{"message": {"content": "The image shows a"}, "finish_reason": "length"}]}"#;
        let response: CompletionResponse = serde_json::from_str(json).unwrap();
        assert!(response.is_truncated());
        assert_eq!(response.into_answer().unwrap(), "The image shows a");

        let complete: CompletionResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"content": "A cat."}, "finish_reason": "stop"}]}"#,
        )
        .unwrap();
        assert!(!complete.is_truncated());
    }

    #[test]
    fn test_completion_response_malformed_shapes() {
        let empty: CompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(empty.into_answer(), Err(Error::Api(_))));

        let missing: CompletionResponse = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        assert!(matches!(missing.into_answer(), Err(Error::Api(_))));

        let null_content: CompletionResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(matches!(null_content.into_answer(), Err(Error::Api(_))));
    }

    #[test]
    fn test_api_error_body_message() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(
            ApiErrorBody::message_from(body).as_deref(),
            Some("Incorrect API key provided")
        );
        assert_eq!(ApiErrorBody::message_from("<html>bad gateway</html>"), None);
    }
}
