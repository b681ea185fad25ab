//! Client representation
//!
//! A `Client` presents one [`Peer`] identity to its broker over a single
//! persistent connection. Messages pushed by the broker are buffered until a
//! consumer pulls them; consumers that arrive first are parked until a
//! message shows up. Both queues are first-in first-out.
//!
//! The connection is opened at most once. When it ends, for whatever
//! reason, parked consumers see the end of the sequence and the client stays
//! closed; a new `Client` is needed to connect again.

use std::fmt;
use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::debug;

use crate::client::shared::{Listener, Shared};
use crate::client::state::ConnectionState;
use crate::client::stream::{Messages, NextMessage};
use crate::peer::{Peer, Scheme};
use crate::transport::{Connector, WebSocketConnector};
use crate::utils::error::ConnectionError;

pub struct Client {
    peer: Peer,
    connector: Arc<dyn Connector>,
    shared: Arc<Shared>,
}

impl Client {
    /// Create a client for `peer` that connects over WebSocket.
    pub fn new(peer: Peer) -> Self {
        Self::with_connector(peer, Arc::new(WebSocketConnector))
    }

    /// Create a client that opens its connection through `connector`.
    pub fn with_connector(peer: Peer, connector: Arc<dyn Connector>) -> Self {
        Self {
            peer,
            connector,
            shared: Shared::new(),
        }
    }

    /// Create a client for `peer` and connect it, passing `query` to the broker.
    pub async fn connect_as(peer: Peer, query: Option<&str>) -> Result<Self, ConnectionError> {
        let client = Self::new(peer);
        client.connect(query).await?;
        Ok(client)
    }

    /// The identity this client presents to the broker.
    pub fn peer(&self) -> &Peer {
        &self.peer
    }

    /// Connects to the broker as this client's peer.
    ///
    /// `query` is an already encoded query string handed to the broker.
    /// Resolves once the connection is open. If a connection was already
    /// started, including one that has since closed, this returns `Ok(())`
    /// right away and does nothing.
    pub async fn connect(&self, query: Option<&str>) -> Result<(), ConnectionError> {
        let (handshake_tx, handshake_rx) = oneshot::channel();
        if !self.shared.begin_connect(handshake_tx) {
            return Ok(());
        }

        let url = self.peer.url(Scheme::WebSocket, query);
        debug!("Connecting as {} via {url}", self.peer);

        match self.connector.open(&url, Listener::new(&self.shared)) {
            Ok(socket) => self.shared.install(socket),
            Err(e) => {
                self.shared.abort_connect();
                return Err(ConnectionError::Open(e));
            }
        }

        handshake_rx
            .await
            .unwrap_or(Err(ConnectionError::ClosedBeforeOpen))
    }

    /// `true` only while the connection is open.
    pub fn connected(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Pulls the next message.
    ///
    /// Whether the client is connected is checked when this is called, not
    /// when the future is first polled, and pending calls are served in the
    /// order they were made. See [`NextMessage`] for the possible outcomes.
    /// Messages still buffered when the connection ends are not returned.
    pub fn next_message(&self) -> NextMessage {
        self.shared.next_message()
    }

    /// All messages as a stream, ending when the connection ends.
    pub fn messages(&self) -> Messages {
        Messages::new(self.shared.clone())
    }

    /// Resolves once the connection has ended.
    pub async fn closed(&self) {
        let mut state = self.shared.subscribe_state();
        let _ = state
            .wait_for(|state| *state == ConnectionState::Closed)
            .await;
    }

    /// Asks the transport to close the connection.
    ///
    /// The client becomes closed when the transport reports the close, at
    /// which point pending consumers see the end of the sequence.
    pub fn close(&self) {
        self.shared.close_socket();
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("peer", &self.peer)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
