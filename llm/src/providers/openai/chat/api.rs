use crate::api::{ChatMessage, ChatPayload, ChatRequest, ContentBlock, ImageDetail, Role};
use serde::{Deserialize, Serialize};

/// OpenAI content part for multimodal messages
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrlContent },
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ImageUrlContent {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<ImageDetail>,
}

/// OpenAI message content - can be a string or array of parts
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Message {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
}

impl Message {
    fn from_chat_message(msg: &ChatMessage, detail: Option<ImageDetail>) -> Self {
        let parts: Vec<ContentPart> = msg
            .payload
            .content
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => ContentPart::Text { text: text.clone() },
                ContentBlock::Image { data, mime_type } => ContentPart::ImageUrl {
                    // OpenAI expects data URLs for base64 images
                    image_url: ImageUrlContent {
                        url: format!("data:{};base64,{}", mime_type, data),
                        detail,
                    },
                },
            })
            .collect();

        let content = match parts.as_slice() {
            [] => None,
            // Single text part can use simple string format
            [ContentPart::Text { text }] => Some(MessageContent::Text(text.clone())),
            _ => Some(MessageContent::Parts(parts)),
        };

        Message {
            role: msg.role,
            content,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatCompletionRequest {
    pub fn from_request(model: String, request: &ChatRequest) -> Self {
        let options = request.options();
        ChatCompletionRequest {
            model,
            messages: request
                .messages()
                .iter()
                .map(|m| Message::from_chat_message(m, options.image_detail))
                .collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ChatCompletionChoice {
    #[serde(default)]
    pub index: u32,
    pub message: Message,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<ChatCompletionChoice>,
}

impl TryFrom<ChatCompletionResponse> for ChatMessage {
    type Error = anyhow::Error;

    fn try_from(response: ChatCompletionResponse) -> anyhow::Result<Self> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Upstream response contained no choices"))?;

        let text = match choice.message.content {
            Some(MessageContent::Text(text)) => text,
            Some(MessageContent::Parts(parts)) => parts
                .into_iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join(""),
            None => String::new(),
        };

        if text.trim().is_empty() {
            anyhow::bail!("Upstream response contained no text");
        }

        Ok(ChatMessage::assistant(ChatPayload::text(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::GenerationOptions;
    use serde_json::json;

    #[test]
    fn test_text_message_uses_plain_string() {
        let messages = vec![
            ChatMessage::system(ChatPayload::text("be kind")),
            ChatMessage::user(ChatPayload::text("2+2")),
        ];
        let request = ChatRequest::new(&messages).with_options(GenerationOptions {
            temperature: Some(0.6),
            ..Default::default()
        });

        let body = serde_json::to_value(ChatCompletionRequest::from_request(
            "gpt-3.5-turbo".into(),
            &request,
        ))
        .unwrap();

        assert_eq!(
            body,
            json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    {"role": "system", "content": "be kind"},
                    {"role": "user", "content": "2+2"}
                ],
                "temperature": 0.6
            })
        );
    }

    #[test]
    fn test_image_message_uses_parts_with_data_url() {
        let messages = vec![ChatMessage::user(ChatPayload::text_and_image(
            "solve it",
            "AAAA",
            "image/png",
        ))];
        let request = ChatRequest::new(&messages).with_options(GenerationOptions {
            temperature: Some(0.7),
            max_tokens: Some(1000),
            image_detail: Some(ImageDetail::High),
        });

        let body =
            serde_json::to_value(ChatCompletionRequest::from_request("gpt-4o".into(), &request))
                .unwrap();

        assert_eq!(body["max_tokens"], json!(1000));
        assert_eq!(
            body["messages"][0]["content"],
            json!([
                {"type": "text", "text": "solve it"},
                {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA", "detail": "high"}}
            ])
        );
    }

    #[test]
    fn test_response_to_message() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1,
            "model": "gpt-3.5-turbo",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "4"},
                "finish_reason": "stop"
            }]
        }))
        .unwrap();

        let message = ChatMessage::try_from(response).unwrap();
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.get_text(), "4");
    }

    #[test]
    fn test_response_without_choices_is_error() {
        let response: ChatCompletionResponse =
            serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(ChatMessage::try_from(response).is_err());
    }

    #[test]
    fn test_response_with_null_content_is_error() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": null}, "finish_reason": "stop"}]
        }))
        .unwrap();
        assert!(ChatMessage::try_from(response).is_err());
    }
}
