use crate::attachment::AttachmentError;
use thiserror::Error;

/// Why a submission was refused before any network call.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Type a question or pick an image first")]
    EmptyTurn,

    #[error("Please sign in to chat with Math Buddy")]
    Unauthenticated,

    #[error("Math Buddy is still answering the last question")]
    Busy,

    #[error("No follow-up suggestions are showing")]
    NoSuggestions,

    #[error("There is no suggestion number {0}")]
    UnknownSuggestion(usize),

    #[error(transparent)]
    Attachment(#[from] AttachmentError),
}
