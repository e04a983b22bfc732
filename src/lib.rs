//! # PictoQuery
//!
//! Ask natural-language questions about an uploaded image. Each question is
//! forwarded, together with the image, to an OpenAI-compatible multimodal
//! chat-completion endpoint and the answer is appended to a chat transcript.
//!
//! ## Overview
//!
//! The crate is a thin controller around one outbound call:
//!
//! - A [`Session`] holds one user's transcript, the active image and the last
//!   accepted question.
//! - A [`ChatController`] uploads images into a session, submits questions and
//!   renders the transcript with HTML escaping applied.
//! - A [`CompletionBackend`] performs the request; [`HttpCompletion`] is the
//!   reqwest-based implementation used by default.
//!
//! ## Example
//!
//! ```rust,no_run
//! use pictoquery::{ChatController, Session, SessionOptions, SubmitAction, SubmitOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = SessionOptions::builder()
//!         .model("gpt-4o")
//!         .base_url("https://api.openai.com/v1")
//!         .api_key(std::env::var("OPENAI_API_KEY")?)
//!         .build()?;
//!
//!     let controller = ChatController::new(options)?;
//!     let mut session = Session::new();
//!
//!     let bytes = std::fs::read("cat.png")?;
//!     controller.upload_image(&mut session, &bytes, "image/png")?;
//!
//!     let outcome = controller
//!         .submit_question(&mut session, "What is in this image?", SubmitAction::Send)
//!         .await?;
//!
//!     if let SubmitOutcome::Answered { answer } = outcome {
//!         println!("{}", answer);
//!     }
//!
//!     for message in controller.render_transcript(&session) {
//!         println!("{}", message.to_html());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **controller**: upload / submit / render operations over a session
//! - **session**: per-session state and its Empty / HasImage lifecycle
//! - **completion**: the backend trait, request building and the HTTP client
//! - **render**: HTML escaping and display fragments
//! - **types**: messages, image payloads, options and wire formats
//! - **config**: provider defaults, environment lookup and the secrets file
//! - **error**: the `Error` enum and `Result<T>` alias

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

/// Session controller: image upload, question round-trips, transcript rendering.
mod controller;

/// Chat-completion backend trait and its reqwest implementation.
mod completion;

/// Provider defaults, environment variables and the TOML secrets file.
mod config;

/// Error types and conversions.
mod error;

/// HTML escaping for transcript display.
mod render;

/// Per-session state.
mod session;

/// Messages, image payloads, options and wire types.
mod types;

// ============================================================================
// PUBLIC EXPORTS
// ============================================================================

// --- Controller ---

pub use controller::{ChatController, IgnoreReason, SubmitAction, SubmitOutcome};

// --- Session ---

pub use session::{Session, SessionState};

// --- Completion Backend ---

pub use completion::{CompletionBackend, HttpCompletion, build_request};

// --- Rendering ---

pub use render::{
    RenderedMessage, escape_html, render_messages, strip_control_chars, transcript_html,
};

// --- Configuration ---

pub use config::{
    API_KEY_ENV, BASE_URL_ENV, DEFAULT_MODEL, DEFAULT_SECRETS_PATH, LEGACY_MODEL, MODEL_ENV,
    Provider, Secrets, get_api_key, get_base_url, get_model,
};

// --- Error Handling ---

pub use error::{Error, Result};

// --- Core Types ---

pub use types::{
    CompletionRequest, ContentPart, ImageDetail, ImageMime, ImagePayload, ImageUrl, Message,
    MessageRole, RequestContent, RequestMessage, SessionOptions, SessionOptionsBuilder,
};

// ============================================================================
// CONVENIENCE PRELUDE
// ============================================================================

/// The types most callers need: `use pictoquery::prelude::*;`
pub mod prelude {
    pub use crate::{
        ChatController, CompletionBackend, Error, ImageMime, Message, MessageRole, Result,
        Session, SessionOptions, SubmitAction, SubmitOutcome,
    };
}
