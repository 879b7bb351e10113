use async_trait::async_trait;
use std::sync::Arc;

pub mod api;
mod client;
pub mod providers;
pub mod traffic_log;

pub use api::*;
pub use providers::OpenAIProvider;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelCapability {
    Text,
    Image,
}

#[derive(Clone, Debug)]
pub struct ModelDefinition {
    pub id: String,
    pub capabilities: Vec<ModelCapability>,
}

impl ModelDefinition {
    pub fn new(id: impl Into<String>, capabilities: Vec<ModelCapability>) -> Self {
        Self {
            id: id.into(),
            capabilities,
        }
    }

    pub fn text_model(id: impl Into<String>) -> Self {
        Self::new(id, vec![ModelCapability::Text])
    }

    /// A model that accepts image parts alongside text
    pub fn vision_model(id: impl Into<String>) -> Self {
        Self::new(id, vec![ModelCapability::Text, ModelCapability::Image])
    }

    pub fn has_capability(&self, capability: &ModelCapability) -> bool {
        self.capabilities.contains(capability)
    }
}

#[async_trait]
pub trait ChatModel {
    fn name(&self) -> &str;

    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatMessage>;
}

// Blanket implementation for Arc<dyn ChatModel> to make it easier to work with
#[async_trait]
impl ChatModel for Arc<dyn ChatModel + Send + Sync> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatMessage> {
        (**self).chat(request).await
    }
}

pub trait ModelProvider {
    /// Create a chat model for the given definition, returned as Arc for sharing across tasks
    fn create_chat_model(
        &self,
        model: &ModelDefinition,
    ) -> Option<Arc<dyn ChatModel + Send + Sync>>;
}
