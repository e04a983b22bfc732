//! Display-ready transcript fragments
//!
//! Message content comes from the user and from the model, so it is escaped
//! before it ever reaches markup. [`RenderedMessage::content`] is already
//! escaped; callers embed it as-is. Terminal output goes through
//! [`strip_control_chars`] instead.

use crate::types::{Message, MessageRole};

/// Escapes `&`, `<`, `>`, quotes and `/` so text is shown literally.
pub fn escape_html(text: &str) -> String {
    html_escape::encode_safe(text).into_owned()
}

/// Drops control characters (ESC and friends) except newline and tab, so
/// text printed to a terminal cannot move the cursor or recolor output.
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t'))
        .collect()
}

/// One transcript entry prepared for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    role: MessageRole,
    content: String,
}

impl RenderedMessage {
    pub fn from_message(message: &Message) -> Self {
        Self {
            role: message.role(),
            content: escape_html(message.content()),
        }
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn label(&self) -> &'static str {
        match self.role {
            MessageRole::User => "You",
            MessageRole::Assistant => "GPT",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self.role {
            MessageRole::User => "💬",
            MessageRole::Assistant => "🤖",
        }
    }

    /// Escaped content
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn to_html(&self) -> String {
        format!(
            "<div class='message'><p><strong>{} {}:</strong> {}</p></div>",
            self.icon(),
            self.label(),
            self.content
        )
    }
}

pub fn render_messages(messages: &[Message]) -> Vec<RenderedMessage> {
    messages.iter().map(RenderedMessage::from_message).collect()
}

/// Whole transcript as one scrollable fragment, oldest message first
pub fn transcript_html(rendered: &[RenderedMessage]) -> String {
    let mut html = String::from("<div class='chat-scroll'>\n");
    for message in rendered {
        html.push_str(&message.to_html());
        html.push('\n');
    }
    html.push_str("</div>\n");
    html
}
