//! Chat session controller
//!
//! [`ChatController`] runs one round-trip per accepted question: it appends the
//! user's message, asks the completion backend about the session's current
//! image, and appends the answer. Session state is passed in explicitly, so a
//! single controller can serve any number of independent [`Session`]s.
//!
//! ## Submission Rules
//!
//! ```text
//! submit_question(text, action)
//!     │
//!     ├─> InputChanged with empty or unchanged text ──> Ignored(Unchanged)
//!     │
//!     ├─> no image uploaded ──> Err(MissingImage), transcript untouched
//!     │
//!     ├─> blank text ──> Ignored(Blank)
//!     │
//!     ├─> push user message, remember text as last question
//!     │
//!     ├─> backend.complete(request)
//!     │       ├─> Ok(answer) ──> push assistant message, Answered { answer }
//!     │       └─> Err(e)     ──> Err(CompletionRequestFailed), user message kept
//! ```
//!
//! Only `InputChanged` is debounced against the last question. An explicit
//! `Send` always goes through, even when the text repeats.

use crate::completion::{CompletionBackend, HttpCompletion, build_request};
use crate::render::{RenderedMessage, render_messages};
use crate::session::Session;
use crate::types::{ImageMime, ImagePayload, Message, SessionOptions};
use crate::{Error, Result};
use std::path::Path;

/// What triggered a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitAction {
    /// The user explicitly asked to send
    Send,
    /// The input widget reported its current value, e.g. on re-render
    InputChanged,
}

/// Why a submission was dropped without touching the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Empty or whitespace-only text
    Blank,
    /// An `InputChanged` event repeating the last accepted question
    Unchanged,
}

/// Result of an accepted or ignored submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The transcript gained a user and an assistant message
    Answered { answer: String },
    /// Nothing happened
    Ignored(IgnoreReason),
}

impl SubmitOutcome {
    /// The transcript changed and should be displayed again from the top.
    pub fn requires_redraw(&self) -> bool {
        matches!(self, SubmitOutcome::Answered { .. })
    }
}

/// Orchestrates uploads and question round-trips for sessions
pub struct ChatController<B = HttpCompletion> {
    options: SessionOptions,
    backend: B,
}

impl<B> std::fmt::Debug for ChatController<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatController")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ChatController<HttpCompletion> {
    /// Creates a controller that talks to `options.base_url()` over HTTP.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the HTTP client cannot be built.
    pub fn new(options: SessionOptions) -> Result<Self> {
        let backend = HttpCompletion::new(&options)?;
        Ok(Self { options, backend })
    }
}

impl<B: CompletionBackend> ChatController<B> {
    /// Creates a controller with a custom backend (test doubles, proxies).
    pub fn with_backend(options: SessionOptions, backend: B) -> Self {
        Self { options, backend }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Stores `bytes` as the session's image, replacing any previous one.
    ///
    /// `mime` must be one of `image/jpeg`, `image/png` or `image/webp`. The
    /// bytes themselves are not inspected and no size limit applies. An empty
    /// upload fails with `InvalidInput` and leaves the current image in place.
    pub fn upload_image(&self, session: &mut Session, bytes: &[u8], mime: &str) -> Result<()> {
        let mime: ImageMime = mime.parse()?;
        let payload = ImagePayload::from_bytes(bytes, mime)?;

        log::debug!(
            "Image uploaded: {} ({} bytes, {} base64 chars)",
            mime,
            bytes.len(),
            payload.encoded_len()
        );

        session.set_image(payload);
        Ok(())
    }

    /// Reads an image file and uploads it; the type comes from the extension.
    pub async fn upload_image_file(&self, session: &mut Session, path: &Path) -> Result<()> {
        let mime = ImageMime::from_path(path)?;
        let bytes = tokio::fs::read(path).await?;
        self.upload_image(session, &bytes, mime.as_str())
    }

    /// Asks the model about the session's current image.
    ///
    /// # Errors
    ///
    /// - `Error::MissingImage` when nothing was uploaded; the session is untouched.
    /// - `Error::CompletionRequestFailed` when the request fails; the user's
    ///   question stays in the transcript but no answer is added.
    ///
    /// The session remains usable after either error.
    pub async fn submit_question(
        &self,
        session: &mut Session,
        text: &str,
        action: SubmitAction,
    ) -> Result<SubmitOutcome> {
        if action == SubmitAction::InputChanged
            && (text.is_empty() || session.last_submitted_question() == Some(text))
        {
            return Ok(SubmitOutcome::Ignored(IgnoreReason::Unchanged));
        }

        let Some(image) = session.current_image() else {
            log::warn!("Question submitted before any image was uploaded");
            return Err(Error::MissingImage);
        };

        if text.trim().is_empty() {
            return Ok(SubmitOutcome::Ignored(IgnoreReason::Blank));
        }

        log::debug!(
            "Sending question to {} with {} image ({} base64 chars)",
            self.options.model(),
            image.mime(),
            image.encoded_len()
        );
        let request = build_request(&self.options, text, image);

        session.push_message(Message::user(text));
        session.record_question(text);

        match self.backend.complete(&request).await {
            Ok(answer) => {
                log::info!("Received answer ({} chars)", answer.len());
                session.push_message(Message::assistant(answer.clone()));
                Ok(SubmitOutcome::Answered { answer })
            }
            Err(e) => {
                let err = e.into_completion_failure();
                log::warn!("{}", err);
                Err(err)
            }
        }
    }

    /// Escaped transcript in display order. Does not modify the session.
    pub fn render_transcript(&self, session: &Session) -> Vec<RenderedMessage> {
        render_messages(session.transcript())
    }
}
