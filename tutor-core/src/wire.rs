//! JSON and multipart shapes exchanged between the chat client and the backend.

use crate::conversation::MessageRole;
use serde::{Deserialize, Serialize};

pub const CHAT_PATH: &str = "/api/chat";
pub const CHAT_WITH_IMAGE_PATH: &str = "/api/chat/with-image";

/// Multipart field names for `CHAT_WITH_IMAGE_PATH`
pub const IMAGE_FIELD: &str = "image";
pub const MESSAGE_FIELD: &str = "message";
pub const CONTEXT_FIELD: &str = "context";

/// One prior turn forwarded to the backend. Past images travel as a flag only.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ContextEntry {
    pub role: MessageRole,
    pub content: String,
    #[serde(
        rename = "hasImage",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub has_image: bool,
}

/// Body of `POST /api/chat`
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ChatTurnRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<ContextEntry>,
}

/// Successful reply from either route
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ChatReply {
    pub message: String,
}

/// Failure reply from either route
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ErrorReply {
    pub error: String,
}
