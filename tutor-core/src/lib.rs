//! Client-side turn assembly for the Math Buddy tutor
//!
//! This crate provides:
//! - **Conversation**: the append-only thread with its welcome preamble
//! - **Context**: `ConversationContext` and the bounded `ContextWindow` builder
//! - **Attachments**: picked files and rasterized drawings, plus preview handles
//! - **Controller**: `TurnController`, which runs one user turn end-to-end
//! - **Backend**: the `ChatBackend` trait and its HTTP implementation
//! - **Wire**: request/response shapes shared with the server
//!
//! # Example
//!
//! ```ignore
//! let backend = HttpChatBackend::new("http://localhost:3001", Duration::from_secs(60))?;
//! let mut controller = TurnController::new(backend, ContextWindow::default());
//! let outcome = controller.submit(Some(&credential), TurnInput::text("2+2")).await?;
//! ```
pub mod attachment;
pub mod auth;
pub mod backend;
pub mod context;
pub mod controller;
pub mod conversation;
pub mod dictation;
pub mod error;
pub mod progress;
pub mod suggestions;
pub mod tool;
pub mod turn;
pub mod wire;

pub use attachment::{Attachment, AttachmentError, PreviewHandle, PreviewRegistry};
pub use auth::{AuthCredential, TokenStore};
pub use backend::{BackendError, ChatBackend, HttpChatBackend};
pub use context::{ContextWindow, ConversationContext, build_context};
pub use controller::{FALLBACK_REPLY, NewThreadOutcome, TurnController, TurnOutcome, TurnState};
pub use conversation::{Conversation, Message, MessageRole};
pub use dictation::{Dictation, DictationEvent};
pub use error::SubmitError;
pub use progress::{Celebration, MascotMood, ProgressState};
pub use suggestions::SuggestionSet;
pub use tool::ToolResult;
pub use turn::{OutgoingTurn, PendingTurn, TurnInput};
pub use wire::{ChatReply, ChatTurnRequest, ContextEntry, ErrorReply};
