use async_trait::async_trait;
use config::AllowedOrigins;
use llm::{
    ChatMessage, ChatModel, ChatPayload, ChatRequest, ContentBlock, ModelDefinition,
    ModelProvider, Role, UpstreamError,
};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tutor_core::{
    Attachment, AuthCredential, BackendError, ChatBackend, ChatTurnRequest, ContextEntry,
    ContextWindow, HttpChatBackend, MessageRole, OutgoingTurn, TurnController, TurnInput,
    TurnOutcome,
};
use tutor_server::{AppState, ServerHandle, start_server};

type Seen = Arc<Mutex<Vec<(String, ChatRequest)>>>;

/// Provider whose models answer from a fixed script and record every request.
struct StubProvider {
    reply: Result<String, String>,
    seen: Seen,
}

struct StubModel {
    name: String,
    reply: Result<String, String>,
    seen: Seen,
}

#[async_trait]
impl ChatModel for StubModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatMessage> {
        self.seen
            .lock()
            .unwrap()
            .push((self.name.clone(), request.clone()));
        match &self.reply {
            Ok(text) => Ok(ChatMessage::assistant(ChatPayload::text(text.clone()))),
            Err(message) => Err(UpstreamError {
                status: 429,
                message: message.clone(),
            }
            .into()),
        }
    }
}

impl ModelProvider for StubProvider {
    fn create_chat_model(
        &self,
        model: &ModelDefinition,
    ) -> Option<Arc<dyn ChatModel + Send + Sync>> {
        Some(Arc::new(StubModel {
            name: model.id.clone(),
            reply: self.reply.clone(),
            seen: self.seen.clone(),
        }))
    }
}

async fn serve(reply: Result<&str, &str>) -> (ServerHandle, Seen) {
    let seen: Seen = Arc::default();
    let provider = StubProvider {
        reply: reply.map(str::to_string).map_err(str::to_string),
        seen: seen.clone(),
    };
    let state = AppState::new(Some(Arc::new(provider)), AllowedOrigins::Any);
    (start_server(Arc::new(state)).await.unwrap(), seen)
}

fn backend(server: &ServerHandle) -> HttpChatBackend {
    HttpChatBackend::new(server.url(), Duration::from_secs(5)).unwrap()
}

fn credential() -> AuthCredential {
    AuthCredential::new("test-token").unwrap()
}

#[tokio::test]
async fn test_text_turn_round_trip() {
    let (server, seen) = serve(Ok("4")).await;
    let turn = OutgoingTurn::Text(ChatTurnRequest {
        message: "2+2".into(),
        context: vec![ContextEntry {
            role: MessageRole::Assistant,
            content: "What would you like to learn today?".into(),
            has_image: false,
        }],
    });

    let reply = backend(&server).send(&credential(), &turn).await.unwrap();
    assert_eq!(reply.message, "4");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (model, request) = &seen[0];
    assert_eq!(model, "gpt-3.5-turbo");
    let messages = request.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].role, Role::System);
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[2].get_text(), "2+2");
    assert_eq!(request.options().temperature, Some(0.6));
    drop(seen);

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_image_turn_round_trip() {
    let (server, seen) = serve(Ok("x=5")).await;
    let image = Attachment::from_file(vec![1u8, 2, 3], "image/png", "eq.png").unwrap();
    let turn = OutgoingTurn::WithImage {
        message: Some("solve for x".into()),
        image,
        context: vec![ContextEntry {
            role: MessageRole::User,
            content: "Uploaded an image".into(),
            has_image: true,
        }],
    };

    let reply = backend(&server).send(&credential(), &turn).await.unwrap();
    assert_eq!(reply.message, "x=5");

    let seen = seen.lock().unwrap();
    let (model, request) = &seen[0];
    assert_eq!(model, "gpt-4o");
    let messages = request.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].get_text(), "Uploaded an image [image attached]");
    assert!(!messages[1].payload.has_images());
    assert_eq!(
        messages[2].payload.content,
        vec![
            ContentBlock::Text {
                text: "solve for x".into()
            },
            ContentBlock::Image {
                data: "AQID".into(),
                mime_type: "image/png".into()
            },
        ]
    );
    assert_eq!(request.options().max_tokens, Some(1000));
    drop(seen);

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_missing_bearer_is_rejected() {
    let (server, seen) = serve(Ok("4")).await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/chat", server.url()))
        .json(&json!({"message": "2+2"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"error": "Missing bearer token"}));
    assert!(seen.lock().unwrap().is_empty());

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unconfigured_provider_fails_per_request() {
    let state = AppState::new(None, AllowedOrigins::Any);
    let server = start_server(Arc::new(state)).await.unwrap();
    let turn = OutgoingTurn::Text(ChatTurnRequest {
        message: "2+2".into(),
        context: vec![],
    });

    let err = backend(&server).send(&credential(), &turn).await.unwrap_err();
    assert!(matches!(err, BackendError::Server { status: 500, .. }));
    assert_eq!(err.user_message(), Some("OpenAI API key not configured"));

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_upstream_failure_message_is_forwarded() {
    let (server, _seen) = serve(Err("Rate limit reached")).await;
    let turn = OutgoingTurn::Text(ChatTurnRequest {
        message: "2+2".into(),
        context: vec![],
    });

    let err = backend(&server).send(&credential(), &turn).await.unwrap_err();
    assert_eq!(err.user_message(), Some("Rate limit reached"));

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_bad_requests_are_400() {
    let (server, seen) = serve(Ok("4")).await;
    let client = reqwest::Client::new();
    let chat = format!("{}/api/chat", server.url());
    let with_image = format!("{}/api/chat/with-image", server.url());

    let empty = client
        .post(&chat)
        .bearer_auth("t")
        .json(&json!({"message": "  "}))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    let no_message = client
        .post(&chat)
        .bearer_auth("t")
        .json(&json!({"context": []}))
        .send()
        .await
        .unwrap();
    assert_eq!(no_message.status(), StatusCode::BAD_REQUEST);

    let no_image = client
        .post(&with_image)
        .bearer_auth("t")
        .multipart(Form::new().text("message", "hi"))
        .send()
        .await
        .unwrap();
    assert_eq!(no_image.status(), StatusCode::BAD_REQUEST);
    let body: Value = no_image.json().await.unwrap();
    assert_eq!(body["error"], "No image uploaded");

    let not_image = client
        .post(&with_image)
        .bearer_auth("t")
        .multipart(
            Form::new().part(
                "image",
                Part::bytes(b"%PDF".to_vec())
                    .file_name("hw.pdf")
                    .mime_str("application/pdf")
                    .unwrap(),
            ),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(not_image.status(), StatusCode::BAD_REQUEST);

    let bad_context = client
        .post(&with_image)
        .bearer_auth("t")
        .multipart(
            Form::new()
                .part(
                    "image",
                    Part::bytes(vec![1u8])
                        .file_name("a.png")
                        .mime_str("image/png")
                        .unwrap(),
                )
                .text("context", "not json"),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(bad_context.status(), StatusCode::BAD_REQUEST);

    assert!(seen.lock().unwrap().is_empty());
    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_cors_preflight_and_origin_list() {
    let (server, _seen) = serve(Ok("4")).await;
    let client = reqwest::Client::new();

    let preflight = client
        .request(reqwest::Method::OPTIONS, format!("{}/api/chat", server.url()))
        .header("Origin", "http://localhost:3000")
        .send()
        .await
        .unwrap();
    assert!(preflight.status().is_success());
    assert_eq!(
        preflight.headers()["access-control-allow-origin"],
        "*"
    );
    server.shutdown().await.unwrap();

    let state = AppState::new(None, AllowedOrigins::parse("https://mathbuddy.example"));
    let server = start_server(Arc::new(state)).await.unwrap();
    let allowed = client
        .request(reqwest::Method::OPTIONS, format!("{}/api/chat", server.url()))
        .header("Origin", "https://mathbuddy.example")
        .send()
        .await
        .unwrap();
    assert_eq!(
        allowed.headers()["access-control-allow-origin"],
        "https://mathbuddy.example"
    );
    let denied = client
        .request(reqwest::Method::OPTIONS, format!("{}/api/chat", server.url()))
        .header("Origin", "https://elsewhere.example")
        .send()
        .await
        .unwrap();
    assert!(denied.headers().get("access-control-allow-origin").is_none());
    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_controller_against_live_server() {
    let (server, seen) = serve(Ok("x=5")).await;
    let mut controller = TurnController::new(backend(&server), ContextWindow::default());
    let credential = credential();

    let outcome = controller
        .submit(Some(&credential), TurnInput::text("2x = 10"))
        .await
        .unwrap();
    assert!(matches!(outcome, TurnOutcome::Answered { ref reply, .. } if reply == "x=5"));

    let image = Attachment::from_file(vec![9u8; 16], "image/jpeg", "page.jpg").unwrap();
    controller
        .submit(Some(&credential), TurnInput::with_image("", image))
        .await
        .unwrap();

    let texts: Vec<&str> = controller
        .conversation()
        .messages()
        .iter()
        .map(|m| m.text())
        .collect();
    assert_eq!(&texts[3..], &["2x = 10", "x=5", "Uploaded an image", "x=5"]);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    let (model, second) = &seen[1];
    assert_eq!(model, "gpt-4o");
    // preamble (3) + first exchange (2) as context, plus system and new turn
    assert_eq!(second.messages().len(), 7);
    assert_eq!(
        second.messages()[6].get_text(),
        "What math problem do you see in this image?"
    );
    drop(seen);

    server.shutdown().await.unwrap();
}
