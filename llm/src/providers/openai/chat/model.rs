use crate::ChatModel;
use crate::api::{ChatMessage, ChatRequest};
use crate::client::Client;
use crate::traffic_log;
use async_trait::async_trait;

use super::api::{ChatCompletionRequest, ChatCompletionResponse};

#[derive(Clone)]
pub struct OpenAIChatModel {
    client: Client,
    base_url: String,
    model_name: String,
    accepts_images: bool,
}

impl OpenAIChatModel {
    pub fn new(
        client: Client,
        base_url: String,
        model_name: String,
        accepts_images: bool,
    ) -> Self {
        OpenAIChatModel {
            client,
            base_url,
            model_name,
            accepts_images,
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatMessage> {
        if !self.accepts_images && request.messages().iter().any(|m| m.payload.has_images()) {
            anyhow::bail!("Model {} does not accept images", self.model_name);
        }

        let openai_request = ChatCompletionRequest::from_request(self.model_name.clone(), request);
        traffic_log::log_request(&self.model_name, &openai_request);

        let response: ChatCompletionResponse =
            match self.client.post(self.chat_url(), &openai_request).await {
                Ok(response) => response,
                Err(e) => {
                    traffic_log::log_error(&self.model_name, &e.to_string());
                    return Err(e);
                }
            };
        traffic_log::log_response(&self.model_name, &response);

        ChatMessage::try_from(response)
    }
}
