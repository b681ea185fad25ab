//! Error types shared by the peer client, the transports and the CLI.
//!
//! Each fallible operation gets its own error type so callers can match on
//! exactly what that operation can report:
//!
//! - [`ConnectionError`] from [`Client::connect`](crate::client::Client::connect)
//! - [`ClientError`] from [`Client::next_message`](crate::client::Client::next_message)
//! - [`SendError`] (wrapping [`DeliveryError`]) from [`Client::send`](crate::client::Client::send)
//!
//! [`TransportError`] is what the collaborators (socket and one-shot
//! request transports) hand back to the client.

use thiserror::Error;

/// Failure reported by a socket or request transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// WebSocket protocol or I/O error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// HTTP request failed before a response was received.
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("timed out")]
    Timeout,

    /// The connection was already shut down.
    #[error("connection closed: {0}")]
    Closed(String),

    /// The transport refused the operation (bad URL, missing runtime, ...).
    #[error("refused: {0}")]
    Refused(String),
}

/// The persistent connection could not be opened.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The transport could not even start opening the socket.
    #[error("failed to open connection: {0}")]
    Open(TransportError),

    /// The transport reported an error before the handshake completed.
    #[error("handshake failed: {0}")]
    Handshake(TransportError),

    /// The transport closed before the handshake completed.
    #[error("connection closed before it was opened")]
    ClosedBeforeOpen,
}

/// Problem while pulling the next message off a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The client is not in the open state.
    #[error("NOT CONNECTED")]
    NotConnected,
}

/// The broker answered a one-shot send with a non-success status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("delivery rejected with status {status}: {reason}")]
pub struct DeliveryError {
    /// HTTP status code reported by the broker.
    pub status: u16,
    /// Status text, empty when the broker sent none.
    pub reason: String,
}

/// Problem while delivering a one-shot message.
#[derive(Debug, Error)]
pub enum SendError {
    /// The broker rejected the message.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// The request transport failed or timed out.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SendError {
    /// Status code of a rejected delivery, if the broker answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            SendError::Delivery(e) => Some(e.status),
            SendError::Transport(_) => None,
        }
    }
}
