//! Typed client for the messaging API.
//!
//! Mirrors what the web frontend does: fixed-interval polling of the
//! conversation list, the open chat, presence and the unread badge; a
//! debounced typing indicator; and the upload-then-send attachment path.

use thiserror::Error;

pub mod api;
pub mod outbox;
pub mod sync;
pub mod typing;

pub use api::{ApiClient, MessagingApi};
pub use outbox::{select_files, send_message, FileSelection, PendingFile};
pub use sync::PollHandle;
pub use typing::TypingNotifier;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with `success: false` or a non-2xx status.
    #[error("{message} ({status})")]
    Api { status: u16, message: String },

    #[error("{0}")]
    Invalid(String),
}

/// User-facing messages, the equivalent of the frontend's toasts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Warning(String),
    Error(String),
}
