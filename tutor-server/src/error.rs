use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;
use tutor_core::ErrorReply;

pub const GENERIC_UPSTREAM_ERROR: &str = "An error occurred during your request.";

/// Every failure a route can produce. All of them leave as `{"error": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("OpenAI API key not configured")]
    NotConfigured,

    #[error("Missing bearer token")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Upstream(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotConfigured | ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Keep the provider's own message when it sent one; hide transport details.
    pub fn from_upstream(err: anyhow::Error) -> Self {
        error!("Upstream chat call failed: {:#}", err);
        match err.downcast_ref::<llm::UpstreamError>() {
            Some(upstream) if !upstream.message.trim().is_empty() => {
                ApiError::Upstream(upstream.message.clone())
            }
            _ => ApiError::Upstream(GENERIC_UPSTREAM_ERROR.to_string()),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorReply {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::NotConfigured.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotConfigured.to_string(), "OpenAI API key not configured");
    }

    #[test]
    fn test_upstream_message_kept() {
        let err = anyhow::Error::new(llm::UpstreamError {
            status: 429,
            message: "Rate limit reached".into(),
        });
        assert_eq!(ApiError::from_upstream(err).to_string(), "Rate limit reached");
    }

    #[test]
    fn test_other_failures_are_generic() {
        let err = anyhow::anyhow!("error sending request for url (https://api.openai.com/v1)");
        assert_eq!(ApiError::from_upstream(err).to_string(), GENERIC_UPSTREAM_ERROR);
    }
}
