use crate::api::UpstreamError;
use reqwest::header::HeaderMap;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{Level, event, instrument};

#[derive(Clone)]
pub struct Client {
    client: reqwest::Client,
}

impl Client {
    pub fn with_headers(headers: HeaderMap) -> anyhow::Result<Self> {
        Ok(Client {
            client: reqwest::Client::builder()
                .default_headers(headers)
                .build()?,
        })
    }

    #[instrument(level = "trace", skip(self, request))]
    pub async fn post<U, S, T>(&self, url: U, request: &S) -> anyhow::Result<T>
    where
        U: reqwest::IntoUrl + std::fmt::Debug,
        S: Serialize + Sized,
        T: DeserializeOwned,
    {
        let response = self.client.post(url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(UpstreamError {
                status: status.as_u16(),
                message: error_message_from_body(status, &error_body),
            }
            .into());
        }
        let text = response.text().await?;
        event!(Level::TRACE, response = text);

        Ok(serde_json::from_str::<T>(&text)?)
    }
}

/// Pull a human readable message out of an error body.
/// Providers answer `{"error": {"message": ...}}` or `{"error": "..."}`; anything else is
/// quoted raw.
fn error_message_from_body(status: reqwest::StatusCode, body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let message = parsed.as_ref().and_then(|value| {
        let error = value.get("error")?;
        error
            .get("message")
            .and_then(|m| m.as_str())
            .or_else(|| error.as_str())
            .map(str::to_string)
    });

    match message {
        Some(message) if !message.trim().is_empty() => message,
        _ => format!("Request failed with status {}: {}", status, body),
    }
}
