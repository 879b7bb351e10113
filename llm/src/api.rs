use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Deserialize, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[default]
    Assistant,
    System,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    /// Base64 image data with its MIME type
    Image { data: String, mime_type: String },
}

impl ContentBlock {
    pub fn mime_type(&self) -> Option<&str> {
        match self {
            ContentBlock::Image { mime_type, .. } => Some(mime_type),
            ContentBlock::Text { .. } => None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, Default, PartialEq)]
pub struct ChatPayload {
    pub content: Vec<ContentBlock>,
}

impl ChatPayload {
    pub fn text(text: impl Into<String>) -> Self {
        ChatPayload {
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// A text description followed by one image, in that order
    pub fn text_and_image(
        text: impl Into<String>,
        data: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        ChatPayload {
            content: vec![
                ContentBlock::Text { text: text.into() },
                ContentBlock::Image {
                    data: data.into(),
                    mime_type: mime_type.into(),
                },
            ],
        }
    }

    pub fn get_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Get images from this payload as (data, mime_type)
    pub fn get_images(&self) -> Vec<(&str, &str)> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Image { data, mime_type } => {
                    Some((data.as_str(), mime_type.as_str()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn has_images(&self) -> bool {
        self.content
            .iter()
            .any(|block| matches!(block, ContentBlock::Image { .. }))
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, Default, PartialEq)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: Role,
    #[serde(flatten)]
    pub payload: ChatPayload,
}

impl ChatMessage {
    pub fn new(role: Role, payload: ChatPayload) -> Self {
        Self { role, payload }
    }

    pub fn user(payload: ChatPayload) -> Self {
        Self::new(Role::User, payload)
    }

    pub fn assistant(payload: ChatPayload) -> Self {
        Self::new(Role::Assistant, payload)
    }

    pub fn system(payload: ChatPayload) -> Self {
        Self::new(Role::System, payload)
    }

    pub fn get_text(&self) -> String {
        self.payload.get_text()
    }
}

/// How closely the model should look at image parts
#[derive(Copy, Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    Low,
    High,
    Auto,
}

/// Sampling options forwarded to the provider. `None` leaves the provider default.
#[derive(Clone, Debug, Deserialize, Serialize, Default, PartialEq)]
pub struct GenerationOptions {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub image_detail: Option<ImageDetail>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ChatRequest {
    pub(crate) messages: Vec<ChatMessage>,
    pub(crate) options: GenerationOptions,
}

impl ChatRequest {
    /// Create a new chat request from an iterator of message references.
    /// Messages are cloned only once when constructing the request.
    pub fn new<'a>(messages: impl IntoIterator<Item = &'a ChatMessage>) -> Self {
        ChatRequest {
            messages: messages.into_iter().cloned().collect(),
            options: GenerationOptions::default(),
        }
    }

    /// Create a request that owns its messages
    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        ChatRequest {
            messages,
            options: GenerationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }
}

/// A non-success answer from the provider, with the best message we could extract.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct UpstreamError {
    pub status: u16,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_payload_text() {
        let payload = ChatPayload::text("Hello, world!");
        assert_eq!(payload.get_text(), "Hello, world!");
        assert_eq!(payload.content.len(), 1);
        assert!(!payload.has_images());
    }

    #[test]
    fn test_text_and_image_keeps_order() {
        let payload = ChatPayload::text_and_image("what is this?", "aGk=", "image/png");
        assert!(matches!(payload.content[0], ContentBlock::Text { .. }));
        assert_eq!(payload.content[1].mime_type(), Some("image/png"));
        assert_eq!(payload.get_images(), vec![("aGk=", "image/png")]);
        assert_eq!(payload.get_text(), "what is this?");
    }

    #[test]
    fn test_chat_message_constructors() {
        let payload = ChatPayload::text("Test");

        let user_msg = ChatMessage::user(payload.clone());
        assert_eq!(user_msg.role, Role::User);
        assert_eq!(user_msg.get_text(), "Test");

        assert_eq!(ChatMessage::assistant(payload.clone()).role, Role::Assistant);
        assert_eq!(ChatMessage::system(payload).role, Role::System);
    }

    #[test]
    fn test_chat_request_defaults() {
        let messages = vec![ChatMessage::user(ChatPayload::text("Hello"))];
        let request = ChatRequest::new(&messages);

        assert_eq!(request.messages().len(), 1);
        assert_eq!(request.options(), &GenerationOptions::default());
    }

    #[test]
    fn test_chat_request_with_options() {
        let request = ChatRequest::from_messages(vec![]).with_options(GenerationOptions {
            temperature: Some(0.6),
            ..Default::default()
        });
        assert_eq!(request.options().temperature, Some(0.6));
        assert!(request.options().max_tokens.is_none());
    }

    #[test]
    fn test_content_block_serialization() {
        let block = ContentBlock::Text {
            text: "Hello".to_string(),
        };
        let json = serde_json::to_string(&block).unwrap();
        assert!(json.contains("\"type\":\"text\""));
        assert!(json.contains("\"text\":\"Hello\""));
    }
}
