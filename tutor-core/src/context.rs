//! Conversation context abstractions
//!
//! `ConversationContext` provides a read-only view of the thread, and
//! `build_context` turns it into the bounded list of prior turns that
//! accompanies a new question.
//!
//! The new turn itself never appears here: the builder runs against the
//! conversation as it was before the user message was appended, and the
//! new text and image travel in their own request fields.

use crate::conversation::{Message, MessageRole};
use crate::wire::ContextEntry;
use config::ContextWindowSetting;

/// Read-only view of conversation messages
///
/// Synchronous and in-memory; all messages must be immediately available.
pub trait ConversationContext {
    /// Iterate messages oldest first
    fn iter(&self) -> impl Iterator<Item = &Message>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConversationContext for [Message] {
    fn iter(&self) -> impl Iterator<Item = &Message> {
        <[Message]>::iter(self)
    }

    fn len(&self) -> usize {
        <[Message]>::len(self)
    }
}

/// Which trailing part of the thread is forwarded with a new turn
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContextWindow {
    /// The most recent `n` messages of either role
    LastMessages(usize),
    /// The most recent `n` user inputs only
    LastUserInputs(usize),
}

impl Default for ContextWindow {
    fn default() -> Self {
        ContextWindow::LastMessages(10)
    }
}

impl From<ContextWindowSetting> for ContextWindow {
    fn from(setting: ContextWindowSetting) -> Self {
        match setting {
            ContextWindowSetting::LastMessages { size } => ContextWindow::LastMessages(size),
            ContextWindowSetting::LastUserInputs { size } => ContextWindow::LastUserInputs(size),
        }
    }
}

impl ContextWindow {
    pub fn size(&self) -> usize {
        match self {
            ContextWindow::LastMessages(n) | ContextWindow::LastUserInputs(n) => *n,
        }
    }

    fn admits(&self, message: &Message) -> bool {
        match self {
            ContextWindow::LastMessages(_) => true,
            ContextWindow::LastUserInputs(_) => message.role() == MessageRole::User,
        }
    }
}

/// Collect the trailing window of `conversation`, oldest first.
///
/// Past images are reduced to a `has_image` flag. Deterministic for a given
/// conversation and window.
pub fn build_context<C>(conversation: &C, window: ContextWindow) -> Vec<ContextEntry>
where
    C: ConversationContext + ?Sized,
{
    let admitted: Vec<&Message> = conversation.iter().filter(|m| window.admits(m)).collect();
    let skip = admitted.len().saturating_sub(window.size());

    admitted
        .into_iter()
        .skip(skip)
        .map(|message| ContextEntry {
            role: message.role(),
            content: message.text().to_string(),
            has_image: message.has_image(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::PreviewHandle;
    use crate::conversation::Conversation;

    fn thread(len: usize) -> Vec<Message> {
        (0..len)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(format!("question {i}"), None)
                } else {
                    Message::assistant(format!("answer {i}"))
                }
            })
            .collect()
    }

    #[test]
    fn test_window_keeps_most_recent_in_order() {
        let messages = thread(15);
        let context = build_context(messages.as_slice(), ContextWindow::LastMessages(10));

        assert_eq!(context.len(), 10);
        let contents: Vec<&str> = context.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents.first(), Some(&"answer 5"));
        assert_eq!(contents.last(), Some(&"question 14"));
        for pair in context.windows(2) {
            assert_ne!(pair[0].content, pair[1].content);
        }
    }

    #[test]
    fn test_short_thread_is_forwarded_whole() {
        let messages = thread(4);
        let context = build_context(messages.as_slice(), ContextWindow::LastMessages(10));
        assert_eq!(context.len(), 4);
        assert_eq!(context[0].content, "question 0");
    }

    #[test]
    fn test_user_input_window_skips_assistant_turns() {
        let messages = thread(10);
        let context = build_context(messages.as_slice(), ContextWindow::LastUserInputs(3));

        let contents: Vec<&str> = context.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["question 4", "question 6", "question 8"]);
        assert!(context.iter().all(|e| e.role == MessageRole::User));
    }

    #[test]
    fn test_zero_window_is_empty() {
        let messages = thread(6);
        assert!(build_context(messages.as_slice(), ContextWindow::LastMessages(0)).is_empty());
    }

    #[test]
    fn test_images_become_flags() {
        let messages = vec![
            Message::user("Uploaded an image", Some(PreviewHandle::from_raw(7))),
            Message::assistant("x=5"),
        ];
        let context = build_context(messages.as_slice(), ContextWindow::default());
        assert!(context[0].has_image);
        assert!(!context[1].has_image);
    }

    #[test]
    fn test_preamble_is_part_of_the_window() {
        let conversation = Conversation::new();
        let context = build_context(&conversation, ContextWindow::default());
        assert_eq!(context.len(), 3);
        assert!(context.iter().all(|e| e.role == MessageRole::Assistant));
    }

    #[test]
    fn test_deterministic() {
        let messages = thread(12);
        let first = build_context(messages.as_slice(), ContextWindow::default());
        let second = build_context(messages.as_slice(), ContextWindow::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_from_setting() {
        let window: ContextWindow = ContextWindowSetting::LastUserInputs { size: 3 }.into();
        assert_eq!(window, ContextWindow::LastUserInputs(3));
    }
}
