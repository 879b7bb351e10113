use crate::AppState;
use crate::auth::BearerToken;
use crate::error::ApiError;
use crate::translator::{NewTurn, answer_turn};
use axum::Json;
use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use tutor_core::wire::{CONTEXT_FIELD, IMAGE_FIELD, MESSAGE_FIELD};
use tutor_core::{ChatReply, ChatTurnRequest, ContextEntry};

/// `POST /api/chat`
#[instrument(skip_all)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    _token: BearerToken,
    payload: Result<Json<ChatTurnRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if request.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Message is required".to_string()));
    }
    info!(context_len = request.context.len(), "Text turn received");

    let message = answer_turn(&state, &request.context, NewTurn::Text(&request.message)).await?;
    Ok(Json(ChatReply { message }))
}

struct ImageUpload {
    image: Option<(Bytes, String)>,
    message: Option<String>,
    context: Vec<ContextEntry>,
}

async fn read_upload(mut multipart: Multipart) -> Result<ImageUpload, ApiError> {
    let mut upload = ImageUpload {
        image: None,
        message: None,
        context: Vec::new(),
    };

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            IMAGE_FIELD => {
                let mime_type = field.content_type().unwrap_or_default().to_string();
                if !mime_type.starts_with("image/") {
                    return Err(ApiError::BadRequest(format!(
                        "Uploaded file must be an image, got '{}'",
                        mime_type
                    )));
                }
                upload.image = Some((field.bytes().await?, mime_type));
            }
            MESSAGE_FIELD => upload.message = Some(field.text().await?),
            CONTEXT_FIELD => {
                let raw = field.text().await?;
                if !raw.trim().is_empty() {
                    upload.context = serde_json::from_str(&raw)
                        .map_err(|e| ApiError::BadRequest(format!("Invalid context: {}", e)))?;
                }
            }
            other => debug!(field = other, "Ignoring unknown multipart field"),
        }
    }
    Ok(upload)
}

/// `POST /api/chat/with-image`
#[instrument(skip_all)]
pub async fn chat_with_image(
    State(state): State<Arc<AppState>>,
    _token: BearerToken,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let upload = read_upload(multipart).await?;
    let (bytes, mime_type) = upload
        .image
        .ok_or_else(|| ApiError::BadRequest("No image uploaded".to_string()))?;
    info!(
        size = bytes.len(),
        mime_type = %mime_type,
        context_len = upload.context.len(),
        "Image turn received"
    );

    let turn = NewTurn::Image {
        message: upload.message.as_deref(),
        bytes: &bytes,
        mime_type: &mime_type,
    };
    let message = answer_turn(&state, &upload.context, turn).await?;
    Ok(Json(ChatReply { message }))
}
