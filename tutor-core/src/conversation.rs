//! The in-memory chat thread.

use crate::attachment::PreviewHandle;
use crate::context::ConversationContext;
use serde::{Deserialize, Serialize};

/// Assistant messages every thread starts with, in order.
pub const WELCOME_PREAMBLE: [&str; 3] = [
    "👋 Hi! I'm Math Buddy, your personal math tutor!",
    "I can help you with any math problem. You can type your question or upload an image of the problem.",
    "What would you like to learn today?",
];

/// Text shown in place of an image-only user turn
pub const IMAGE_ONLY_TEXT: &str = "Uploaded an image";

/// Placeholder the UI shows while a turn is in flight. Never part of the thread.
pub const THINKING_TEXT: &str = "Thinking...";

#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
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

/// One appended message. Position in the thread is its order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    role: MessageRole,
    text: String,
    image: Option<PreviewHandle>,
}

impl Message {
    pub fn user(text: impl Into<String>, image: Option<PreviewHandle>) -> Self {
        Message {
            role: MessageRole::User,
            text: text.into(),
            image,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Message {
            role: MessageRole::Assistant,
            text: text.into(),
            image: None,
        }
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn image(&self) -> Option<&PreviewHandle> {
        self.image.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

/// Append-only message sequence owned by a single chat session.
///
/// Only `reset` removes messages, and it always restores the welcome preamble.
#[derive(Clone, Debug)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Conversation {
            messages: WELCOME_PREAMBLE.iter().map(|text| Message::assistant(*text)).collect(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// True once anything beyond the welcome preamble has been appended
    pub fn has_activity(&self) -> bool {
        self.messages.len() > WELCOME_PREAMBLE.len()
    }

    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
            .map(|m| m.text.as_str())
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Restore the preamble, handing back the replaced messages so their
    /// previews can be released.
    pub(crate) fn reset(&mut self) -> Vec<Message> {
        std::mem::replace(self, Conversation::new()).messages
    }
}

impl ConversationContext for Conversation {
    fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    fn len(&self) -> usize {
        self.messages.len()
    }
}
