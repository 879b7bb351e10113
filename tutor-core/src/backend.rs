use crate::attachment::Attachment;
use crate::auth::AuthCredential;
use crate::turn::OutgoingTurn;
use crate::wire::{
    CONTEXT_FIELD, ChatReply, ContextEntry, ErrorReply, IMAGE_FIELD, MESSAGE_FIELD,
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum BackendError {
    /// Non-success status. `message` is the backend's `error` field when it sent one.
    #[error("backend answered {status}: {}", message.as_deref().unwrap_or("no error message"))]
    Server { status: u16, message: Option<String> },

    #[error("could not build request: {0}")]
    Request(String),

    #[error("could not reach backend: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected backend response: {0}")]
    Malformed(String),
}

impl BackendError {
    /// Error text the backend wants shown to the user, if any
    pub fn user_message(&self) -> Option<&str> {
        match self {
            BackendError::Server {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }
}

/// Sends one turn to the tutoring backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(
        &self,
        credential: &AuthCredential,
        turn: &OutgoingTurn,
    ) -> Result<ChatReply, BackendError>;
}

#[async_trait]
impl<T: ChatBackend + ?Sized> ChatBackend for std::sync::Arc<T> {
    async fn send(
        &self,
        credential: &AuthCredential,
        turn: &OutgoingTurn,
    ) -> Result<ChatReply, BackendError> {
        (**self).send(credential, turn).await
    }
}

/// `ChatBackend` over HTTP: JSON for text turns, multipart for image turns.
#[derive(Clone, Debug)]
pub struct HttpChatBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpChatBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(HttpChatBackend {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn form(
        message: Option<&str>,
        image: &Attachment,
        context: &[ContextEntry],
    ) -> Result<Form, BackendError> {
        let part = Part::bytes(image.bytes().to_vec())
            .file_name(image.file_name().to_string())
            .mime_str(image.mime_type())
            .map_err(|e| BackendError::Request(e.to_string()))?;
        let mut form = Form::new().part(IMAGE_FIELD, part);
        if let Some(message) = message {
            form = form.text(MESSAGE_FIELD, message.to_string());
        }
        if !context.is_empty() {
            let context =
                serde_json::to_string(context).map_err(|e| BackendError::Request(e.to_string()))?;
            form = form.text(CONTEXT_FIELD, context);
        }
        Ok(form)
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    #[instrument(level = "debug", skip_all, fields(path = turn.path()))]
    async fn send(
        &self,
        credential: &AuthCredential,
        turn: &OutgoingTurn,
    ) -> Result<ChatReply, BackendError> {
        let url = format!("{}{}", self.base_url, turn.path());
        let request = self.client.post(&url).bearer_auth(credential.token());
        let request = match turn {
            OutgoingTurn::Text(body) => request.json(body),
            OutgoingTurn::WithImage {
                message,
                image,
                context,
            } => request.multipart(Self::form(message.as_deref(), image, context)?),
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), len = body.len(), "backend responded");

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorReply>(&body)
                .ok()
                .map(|reply| reply.error);
            warn!(status = status.as_u16(), ?message, "backend reported failure");
            return Err(BackendError::Server {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str::<ChatReply>(&body).map_err(|e| BackendError::Malformed(e.to_string()))
    }
}
