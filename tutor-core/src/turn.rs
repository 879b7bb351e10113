//! What the user submitted and what goes over the wire for it.

use crate::attachment::Attachment;
use crate::conversation::IMAGE_ONLY_TEXT;
use crate::wire::{CHAT_PATH, CHAT_WITH_IMAGE_PATH, ChatTurnRequest, ContextEntry};

/// A submission as the user made it
#[derive(Clone, Debug)]
pub struct TurnInput {
    text: String,
    attachment: Option<Attachment>,
    display_text: Option<String>,
    is_new_question: bool,
}

impl TurnInput {
    pub fn text(text: impl Into<String>) -> Self {
        TurnInput {
            text: text.into(),
            attachment: None,
            display_text: None,
            is_new_question: true,
        }
    }

    /// Text may be empty; the backend then asks about the image on its own.
    pub fn with_image(text: impl Into<String>, attachment: Attachment) -> Self {
        TurnInput {
            attachment: Some(attachment),
            ..Self::text(text)
        }
    }

    /// A follow-up picked from the suggestion list. It never reopens suggestions.
    pub(crate) fn follow_up(composed: String, shown: impl Into<String>) -> Self {
        TurnInput {
            display_text: Some(shown.into()),
            is_new_question: false,
            ..Self::text(composed)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.attachment.is_none()
    }

    pub fn is_new_question(&self) -> bool {
        self.is_new_question
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    /// Text recorded in the conversation for this turn
    pub(crate) fn shown_text(&self) -> String {
        match &self.display_text {
            Some(shown) => shown.clone(),
            None if self.text.trim().is_empty() => IMAGE_ONLY_TEXT.to_string(),
            None => self.text.clone(),
        }
    }

    pub(crate) fn into_pending(self, context: Vec<ContextEntry>) -> PendingTurn {
        PendingTurn {
            raw_text: self.text,
            attachment: self.attachment,
            context,
            is_new_question: self.is_new_question,
        }
    }
}

/// The one request in flight for a conversation.
#[derive(Clone, Debug)]
pub struct PendingTurn {
    raw_text: String,
    attachment: Option<Attachment>,
    context: Vec<ContextEntry>,
    is_new_question: bool,
}

impl PendingTurn {
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    /// Prior turns captured before this turn's user message was appended
    pub fn context(&self) -> &[ContextEntry] {
        &self.context
    }

    pub fn is_new_question(&self) -> bool {
        self.is_new_question
    }

    pub fn outgoing(&self) -> OutgoingTurn {
        match &self.attachment {
            Some(image) => OutgoingTurn::WithImage {
                message: (!self.raw_text.trim().is_empty()).then(|| self.raw_text.clone()),
                image: image.clone(),
                context: self.context.clone(),
            },
            None => OutgoingTurn::Text(ChatTurnRequest {
                message: self.raw_text.clone(),
                context: self.context.clone(),
            }),
        }
    }
}

/// One backend request: JSON for text, multipart when an image is attached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutgoingTurn {
    Text(ChatTurnRequest),
    WithImage {
        message: Option<String>,
        image: Attachment,
        context: Vec<ContextEntry>,
    },
}

impl OutgoingTurn {
    pub fn path(&self) -> &'static str {
        match self {
            OutgoingTurn::Text(_) => CHAT_PATH,
            OutgoingTurn::WithImage { .. } => CHAT_WITH_IMAGE_PATH,
        }
    }

    pub fn context(&self) -> &[ContextEntry] {
        match self {
            OutgoingTurn::Text(request) => &request.context,
            OutgoingTurn::WithImage { context, .. } => context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png() -> Attachment {
        Attachment::from_file(vec![1u8, 2], "image/png", "p.png").unwrap()
    }

    #[test]
    fn test_empty_input() {
        assert!(TurnInput::text("   ").is_empty());
        assert!(!TurnInput::with_image("", png()).is_empty());
    }

    #[test]
    fn test_image_only_turn_shows_placeholder_and_sends_no_message() {
        let input = TurnInput::with_image("  ", png());
        assert_eq!(input.shown_text(), IMAGE_ONLY_TEXT);

        let outgoing = input.into_pending(vec![]).outgoing();
        assert_eq!(outgoing.path(), CHAT_WITH_IMAGE_PATH);
        match outgoing {
            OutgoingTurn::WithImage { message, image, .. } => {
                assert!(message.is_none());
                assert_eq!(image.mime_type(), "image/png");
            }
            OutgoingTurn::Text(_) => panic!("expected multipart turn"),
        }
    }

    #[test]
    fn test_follow_up_shows_only_suggestion() {
        let input = TurnInput::follow_up(
            "Previous context: \"4\"\n\nMake it harder".into(),
            "Make it harder",
        );
        assert!(!input.is_new_question());
        assert_eq!(input.shown_text(), "Make it harder");

        let outgoing = input.into_pending(vec![]).outgoing();
        assert_eq!(
            outgoing,
            OutgoingTurn::Text(ChatTurnRequest {
                message: "Previous context: \"4\"\n\nMake it harder".into(),
                context: vec![],
            })
        );
    }
}
