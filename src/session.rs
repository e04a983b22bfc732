//! Per-session conversation state
//!
//! A [`Session`] holds everything one user's interaction accumulates: the
//! transcript, the active image and the last question that was accepted. It is
//! plain data; the [`ChatController`](crate::ChatController) mutates it through
//! `&mut Session`, so each session can have at most one request in flight and
//! independent sessions never share state.

use crate::types::{ImagePayload, Message};

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No image uploaded yet; questions are rejected with a warning
    Empty,
    /// An image is active; questions are answered against it
    HasImage,
}

/// In-memory state of one interactive session
#[derive(Debug, Clone, Default)]
pub struct Session {
    transcript: Vec<Message>,
    current_image: Option<ImagePayload>,
    last_submitted_question: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        if self.current_image.is_some() {
            SessionState::HasImage
        } else {
            SessionState::Empty
        }
    }

    /// Messages in display order
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn current_image(&self) -> Option<&ImagePayload> {
        self.current_image.as_ref()
    }

    pub fn last_submitted_question(&self) -> Option<&str> {
        self.last_submitted_question.as_deref()
    }

    /// Drops transcript, image and last question together.
    pub fn clear(&mut self) {
        self.transcript.clear();
        self.current_image = None;
        self.last_submitted_question = None;
    }

    /// Replaces the active image wholesale.
    pub(crate) fn set_image(&mut self, image: ImagePayload) {
        self.current_image = Some(image);
    }

    pub(crate) fn push_message(&mut self, message: Message) {
        self.transcript.push(message);
    }

    pub(crate) fn record_question(&mut self, question: &str) {
        self.last_submitted_question = Some(question.to_string());
    }
}
