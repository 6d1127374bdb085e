//! Error taxonomy shared by the REST client, the realtime channel, and flows.
//!
//! ERROR HANDLING
//! ==============
//! Transport layers return [`ApiError`] or [`ChannelError`]. Flows convert
//! those into [`ClientError`], which carries the user-facing message and how
//! the view should surface it. Nothing here is ever allowed to panic a view.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use crate::net::socket_codec::CodecError;

/// Failure of a REST call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// A protected call was requested without an active session. No request
    /// was sent.
    #[error("not authenticated")]
    Unauthenticated,
    #[error("network error: {0}")]
    Network(String),
    /// Non-2xx response. `message` is the body's `error` field when present.
    #[error("request failed with status {status}")]
    Status { status: u16, message: Option<String> },
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("not available outside the browser")]
    Unavailable,
}

impl ApiError {
    /// Server-provided error text, if the backend sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Failure of the realtime channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// The Socket.IO handshake has not completed yet.
    #[error("realtime channel not connected")]
    NotConnected,
    /// The handle was disconnected; it can't be reused.
    #[error("realtime channel closed")]
    Closed,
    #[error("realtime transport error: {0}")]
    Transport(String),
    /// The server refused the connection (typically a bad token).
    #[error("realtime connection rejected: {0}")]
    Rejected(String),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

pub const CHANNEL_UNAVAILABLE_MESSAGE: &str = "Live connection unavailable. Sending is disabled.";

/// How a view should surface a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Modal alert; the user must acknowledge it.
    Blocking,
    /// Inline, non-blocking message next to the affected control.
    Inline,
}

/// User-facing failure produced by a flow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("{0}")]
    Authentication(String),
    #[error("{0}")]
    Validation(String),
    #[error("network failure: {0}")]
    Network(#[from] ApiError),
    #[error("channel failure: {0}")]
    Channel(#[from] ChannelError),
}

impl ClientError {
    pub fn severity(&self) -> Severity {
        match self {
            Self::Authentication(_) => Severity::Blocking,
            Self::Validation(_) | Self::Network(_) | Self::Channel(_) => Severity::Inline,
        }
    }

    /// Message suitable for direct display.
    pub fn user_message(&self) -> String {
        match self {
            Self::Authentication(msg) | Self::Validation(msg) => msg.clone(),
            Self::Network(ApiError::Unauthenticated) => "Your session has ended. Sign in again.".to_owned(),
            Self::Network(_) => "Could not reach the server. Try again.".to_owned(),
            Self::Channel(_) => CHANNEL_UNAVAILABLE_MESSAGE.to_owned(),
        }
    }
}
