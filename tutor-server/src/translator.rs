//! Rebuilds a client turn as an upstream chat request and runs it.

use crate::AppState;
use crate::error::ApiError;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use llm::{
    ChatMessage, ChatModel, ChatPayload, ChatRequest, GenerationOptions, ImageDetail,
    ModelDefinition,
};
use tracing::{debug, instrument};
use tutor_core::{ContextEntry, MessageRole};

pub const SYSTEM_PROMPT: &str = concat!(
    "You are Math Buddy, a friendly and encouraging math tutor for kids. \n",
    "  Follow these guidelines:\n",
    "  - Explain concepts in simple terms\n",
    "  - Use encouraging language\n",
    "  - Make math fun and engaging\n",
    "  - Break down problems into simple steps\n",
    "  - Use emojis and friendly language\n",
    "  - Keep responses focused on mathematics\n",
    "  - Provide visual examples when possible using ASCII art\n",
    "  - Celebrate success and encourage learning from mistakes",
);

pub const DEFAULT_IMAGE_PROMPT: &str = "What math problem do you see in this image?";
pub const IMAGE_NOTE: &str = " [image attached]";

pub const TEXT_MODEL: &str = "gpt-3.5-turbo";
pub const VISION_MODEL: &str = "gpt-4o";

/// Which route a turn came in on. Fixes the model and sampling options.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TurnRoute {
    Text,
    Vision,
}

impl TurnRoute {
    pub fn model(&self) -> ModelDefinition {
        match self {
            TurnRoute::Text => ModelDefinition::text_model(TEXT_MODEL),
            TurnRoute::Vision => ModelDefinition::vision_model(VISION_MODEL),
        }
    }

    pub fn options(&self) -> GenerationOptions {
        match self {
            TurnRoute::Text => GenerationOptions {
                temperature: Some(0.6),
                ..Default::default()
            },
            TurnRoute::Vision => GenerationOptions {
                temperature: Some(0.7),
                max_tokens: Some(1000),
                image_detail: Some(ImageDetail::High),
            },
        }
    }
}

/// The new turn, separate from its context
#[derive(Clone, Debug)]
pub enum NewTurn<'a> {
    Text(&'a str),
    Image {
        message: Option<&'a str>,
        bytes: &'a [u8],
        mime_type: &'a str,
    },
}

impl NewTurn<'_> {
    pub fn route(&self) -> TurnRoute {
        match self {
            NewTurn::Text(_) => TurnRoute::Text,
            NewTurn::Image { .. } => TurnRoute::Vision,
        }
    }

    fn payload(&self) -> ChatPayload {
        match self {
            NewTurn::Text(text) => ChatPayload::text(*text),
            NewTurn::Image {
                message,
                bytes,
                mime_type,
            } => {
                let text = message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or(DEFAULT_IMAGE_PROMPT);
                ChatPayload::text_and_image(text, BASE64.encode(bytes), *mime_type)
            }
        }
    }
}

fn context_message(entry: &ContextEntry) -> ChatMessage {
    let text = if entry.has_image {
        format!("{}{}", entry.content, IMAGE_NOTE)
    } else {
        entry.content.clone()
    };
    match entry.role {
        MessageRole::User => ChatMessage::user(ChatPayload::text(text)),
        MessageRole::Assistant => ChatMessage::assistant(ChatPayload::text(text)),
    }
}

/// System instruction, then prior turns, then the new turn.
pub fn build_chat_request(context: &[ContextEntry], turn: &NewTurn<'_>) -> ChatRequest {
    let mut messages = Vec::with_capacity(context.len() + 2);
    messages.push(ChatMessage::system(ChatPayload::text(SYSTEM_PROMPT)));
    messages.extend(context.iter().map(context_message));
    messages.push(ChatMessage::user(turn.payload()));

    ChatRequest::from_messages(messages).with_options(turn.route().options())
}

/// One upstream call for one client turn. Returns the reply text.
#[instrument(level = "debug", skip_all, fields(route = ?turn.route(), context_len = context.len()))]
pub async fn answer_turn(
    state: &AppState,
    context: &[ContextEntry],
    turn: NewTurn<'_>,
) -> Result<String, ApiError> {
    let provider = state.provider.as_ref().ok_or(ApiError::NotConfigured)?;
    let definition = turn.route().model();
    let model = provider
        .create_chat_model(&definition)
        .ok_or_else(|| ApiError::Upstream(format!("Model {} is not available", definition.id)))?;

    let request = build_chat_request(context, &turn);
    let reply = model.chat(&request).await.map_err(ApiError::from_upstream)?;
    let text = reply.get_text();
    debug!(model = model.name(), reply_len = text.len(), "Upstream answered");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm::{ContentBlock, Role};

    fn entry(role: MessageRole, content: &str, has_image: bool) -> ContextEntry {
        ContextEntry {
            role,
            content: content.into(),
            has_image,
        }
    }

    #[test]
    fn test_system_prompt_guidelines() {
        assert!(SYSTEM_PROMPT.starts_with(
            "You are Math Buddy, a friendly and encouraging math tutor for kids."
        ));
        assert!(SYSTEM_PROMPT.contains("\n  Follow these guidelines:\n"));
        assert!(SYSTEM_PROMPT.contains("  - Explain concepts in simple terms\n"));
        assert!(
            SYSTEM_PROMPT.contains("  - Provide visual examples when possible using ASCII art\n")
        );
        assert!(!SYSTEM_PROMPT.contains("children"));
    }

    #[test]
    fn test_text_turn_layout() {
        let context = vec![
            entry(MessageRole::User, "2+2", false),
            entry(MessageRole::Assistant, "4", false),
        ];
        let request = build_chat_request(&context, &NewTurn::Text("and 3+3?"));
        let messages = request.messages();

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].get_text(), SYSTEM_PROMPT);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[3].get_text(), "and 3+3?");
        assert_eq!(request.options().temperature, Some(0.6));
        assert!(request.options().max_tokens.is_none());
    }

    #[test]
    fn test_image_turn_is_text_then_data() {
        let turn = NewTurn::Image {
            message: None,
            bytes: b"png",
            mime_type: "image/png",
        };
        let request = build_chat_request(&[], &turn);
        let last = &request.messages()[1];

        assert_eq!(
            last.payload.content,
            vec![
                ContentBlock::Text {
                    text: DEFAULT_IMAGE_PROMPT.into()
                },
                ContentBlock::Image {
                    data: "cG5n".into(),
                    mime_type: "image/png".into()
                },
            ]
        );
        assert_eq!(request.options().max_tokens, Some(1000));
        assert_eq!(request.options().image_detail, Some(ImageDetail::High));
        assert_eq!(turn.route().model().id, VISION_MODEL);
    }

    #[test]
    fn test_blank_image_message_uses_default_prompt() {
        let turn = NewTurn::Image {
            message: Some("  "),
            bytes: b"x",
            mime_type: "image/jpeg",
        };
        let request = build_chat_request(&[], &turn);
        assert_eq!(request.messages()[1].get_text(), DEFAULT_IMAGE_PROMPT);
    }

    #[test]
    fn test_past_image_becomes_note() {
        let context = vec![entry(MessageRole::User, "Uploaded an image", true)];
        let request = build_chat_request(&context, &NewTurn::Text("what was it?"));
        assert_eq!(
            request.messages()[1].get_text(),
            "Uploaded an image [image attached]"
        );
        assert!(!request.messages()[1].payload.has_images());
    }
}
