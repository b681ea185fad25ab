use std::fmt;

/// Lifecycle of a [`Client`](crate::client::Client) connection.
///
/// Owned by the client and moved only by its own event handlers; the
/// transport's view of the socket is never consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection was ever attempted.
    #[default]
    Unconnected,
    /// A socket exists and the handshake is in flight.
    Connecting,
    /// Messages flow.
    Open,
    /// Terminal. A new client is needed to connect again.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Unconnected => "unconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}
