//! HTTP backend for Math Buddy
//!
//! Two routes under `/api` turn a client turn into one upstream chat
//! completion:
//! - `POST /api/chat` takes JSON `{message, context?}`
//! - `POST /api/chat/with-image` takes multipart `image`, `message?`, `context?`
//!
//! Both require a bearer header and answer `{message}` or `{error}`.

pub mod auth;
pub mod error;
pub mod routes;
pub mod translator;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::post;
use config::{AllowedOrigins, ServerEnv};
use llm::{ModelProvider, OpenAIProvider};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tutor_core::wire::{CHAT_PATH, CHAT_WITH_IMAGE_PATH};

/// Largest accepted request body (image uploads)
pub const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Process-wide, read-only state shared by every request.
pub struct AppState {
    /// `None` when no upstream credential is configured; reported per request.
    pub provider: Option<Arc<dyn ModelProvider + Send + Sync>>,
    pub allowed_origins: AllowedOrigins,
}

impl AppState {
    pub fn new(
        provider: Option<Arc<dyn ModelProvider + Send + Sync>>,
        allowed_origins: AllowedOrigins,
    ) -> Self {
        AppState {
            provider,
            allowed_origins,
        }
    }

    pub fn from_env(env: &ServerEnv) -> anyhow::Result<Self> {
        let provider: Option<Arc<dyn ModelProvider + Send + Sync>> = match &env.openai_api_key {
            Some(key) => {
                let provider = match &env.openai_base_url {
                    Some(base_url) => OpenAIProvider::new(base_url, key)?,
                    None => OpenAIProvider::default(key)?,
                };
                Some(Arc::new(provider))
            }
            None => {
                warn!("OPENAI_API_KEY is not set; chat requests will fail until it is");
                None
            }
        };
        Ok(Self::new(provider, env.allowed_origins.clone()))
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(CHAT_PATH, post(routes::chat))
        .route(CHAT_WITH_IMAGE_PATH, post(routes::chat_with_image))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(middleware::from_fn_with_state(state.clone(), auth::cors))
        .with_state(state)
}

/// Handle to a running server
pub struct ServerHandle {
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
    addr: SocketAddr,
}

impl ServerHandle {
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL clients should use, e.g. `http://127.0.0.1:3001`
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop accepting connections and wait for in-flight requests to finish
    pub async fn shutdown(self) -> anyhow::Result<()> {
        let _ = self.shutdown_tx.send(());
        self.task.await?;
        Ok(())
    }
}

/// Start the server on an ephemeral localhost port
pub async fn start_server(state: Arc<AppState>) -> anyhow::Result<ServerHandle> {
    start_server_on("127.0.0.1", 0, state).await
}

pub async fn start_server_on(
    host: &str,
    port: u16,
    state: Arc<AppState>,
) -> anyhow::Result<ServerHandle> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    info!("Starting Math Buddy server on {}", local_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let app = router(state);
    let task = tokio::spawn(async move {
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Shutting down Math Buddy server");
            })
            .await;
        if let Err(e) = served {
            warn!("Server stopped with error: {}", e);
        }
    });

    Ok(ServerHandle {
        shutdown_tx,
        task,
        addr: local_addr,
    })
}
