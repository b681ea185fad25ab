//! Connection state shared between a client, its streams and the transport.
//!
//! Every reconciliation step (a transport event or a consumer pull) runs
//! under a single lock of [`Inner`]. The lock is never held while calling
//! into the transport, so a transport may emit events from inside `open` or
//! `close` without deadlocking.
//!
//! Invariant: at most one of `messages` and `waiters` holds live entries.
//! A message is either parked for a consumer or a consumer is parked for a
//! message.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::{oneshot, watch};
use tracing::{debug, trace};

use crate::client::state::ConnectionState;
use crate::client::stream::NextMessage;
use crate::transport::{Payload, Socket, SocketListener};
use crate::utils::error::{ClientError, ConnectionError, TransportError};

/// A parked consumer. `None` means the sequence is exhausted.
type Waiter = oneshot::Sender<Option<Payload>>;

/// Resolves a pending `connect` call.
pub(crate) type Handshake = oneshot::Sender<Result<(), ConnectionError>>;

#[derive(Default)]
struct Inner {
    state: ConnectionState,
    messages: VecDeque<Payload>,
    waiters: VecDeque<Waiter>,
    handshake: Option<Handshake>,
}

impl Inner {
    /// Hands `payload` to the oldest live waiter, or buffers it.
    fn deliver(&mut self, payload: Payload) {
        if let Some(payload) = self.hand_over(payload) {
            self.messages.push_back(payload);
        }
    }

    /// Puts back a message whose consumer went away after receiving it.
    /// It is older than anything still buffered, so it goes first.
    fn redeliver(&mut self, payload: Payload) {
        if let Some(payload) = self.hand_over(payload) {
            self.messages.push_front(payload);
        }
    }

    /// Gives `payload` to the oldest live waiter. Returns it when none is
    /// left.
    fn hand_over(&mut self, mut payload: Payload) -> Option<Payload> {
        while let Some(waiter) = self.waiters.pop_front() {
            match waiter.send(Some(payload)) {
                Ok(()) => return None,
                // the consumer dropped its future; try the next one
                Err(Some(returned)) => payload = returned,
                Err(None) => return None,
            }
        }
        Some(payload)
    }
}

pub(crate) struct Shared {
    inner: Mutex<Inner>,
    socket: Mutex<Option<Box<dyn Socket>>>,
    state_tx: watch::Sender<ConnectionState>,
}

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Shared {
    pub(crate) fn new() -> Arc<Self> {
        let (state_tx, _) = watch::channel(ConnectionState::Unconnected);
        Arc::new(Self {
            inner: Mutex::new(Inner::default()),
            socket: Mutex::new(None),
            state_tx,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_socket(&self) -> MutexGuard<'_, Option<Box<dyn Socket>>> {
        self.socket.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, inner: &mut Inner, state: ConnectionState) {
        if inner.state != state {
            trace!("Connection state {} -> {}", inner.state, state);
            inner.state = state;
            self.state_tx.send_replace(state);
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.lock().state
    }

    pub(crate) fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Claims the connection for a first `connect` call.
    ///
    /// Returns `false` when a socket already exists (connecting, open or
    /// closed); the caller must then do nothing.
    pub(crate) fn begin_connect(&self, handshake: Handshake) -> bool {
        let mut inner = self.lock();
        if inner.state != ConnectionState::Unconnected {
            return false;
        }
        inner.handshake = Some(handshake);
        self.set_state(&mut inner, ConnectionState::Connecting);
        true
    }

    /// The transport refused to open; the client may try again.
    pub(crate) fn abort_connect(&self) {
        let mut inner = self.lock();
        inner.handshake = None;
        if inner.state == ConnectionState::Connecting {
            self.set_state(&mut inner, ConnectionState::Unconnected);
        }
    }

    pub(crate) fn install(&self, socket: Box<dyn Socket>) {
        *self.lock_socket() = Some(socket);

        // an error may have been reported before the handle was stored
        if self.state() == ConnectionState::Closed {
            self.close_socket();
        }
    }

    /// Best-effort close of the socket handle. Failures are dropped.
    pub(crate) fn close_socket(&self) {
        let Some(mut socket) = self.lock_socket().take() else {
            return;
        };

        if let Err(e) = socket.close() {
            trace!("Ignoring failure to close socket: {e}");
        }

        let mut slot = self.lock_socket();
        if slot.is_none() {
            *slot = Some(socket);
        }
    }

    /// Pull primitive. Resolution of the returned future is decided here,
    /// at call time, so calls are served in the order they were made.
    pub(crate) fn next_message(self: &Arc<Self>) -> NextMessage {
        let mut inner = self.lock();
        if inner.state != ConnectionState::Open {
            return NextMessage::ready(Err(ClientError::NotConnected));
        }
        if let Some(payload) = inner.messages.pop_front() {
            return NextMessage::ready(Ok(Some(payload)));
        }

        inner.waiters.retain(|waiter| !waiter.is_closed());
        let (tx, rx) = oneshot::channel();
        inner.waiters.push_back(tx);
        NextMessage::waiting(rx, Arc::downgrade(self))
    }

    fn on_open(&self) {
        let mut inner = self.lock();
        if inner.state != ConnectionState::Connecting {
            return;
        }
        self.set_state(&mut inner, ConnectionState::Open);
        if let Some(handshake) = inner.handshake.take() {
            let _ = handshake.send(Ok(()));
        }
    }

    fn on_message(&self, payload: Payload) {
        self.lock().deliver(payload);
    }

    /// Returns a message taken by an abandoned [`NextMessage`]. Dropped once
    /// the connection has ended, like any other unread message.
    pub(crate) fn redeliver(&self, payload: Payload) {
        let mut inner = self.lock();
        if inner.state == ConnectionState::Open {
            inner.redeliver(payload);
        }
    }

    fn on_error(&self, error: TransportError) {
        debug!("Transport error: {error}");
        let handshake = {
            let mut inner = self.lock();
            let handshake = inner.handshake.take();
            self.set_state(&mut inner, ConnectionState::Closed);
            handshake
        };

        self.close_socket();
        self.terminate();

        // `connect` returns only once the client is fully closed
        if let Some(handshake) = handshake {
            let _ = handshake.send(Err(ConnectionError::Handshake(error)));
        }
    }

    fn on_close(&self) {
        self.terminate();
    }

    /// Moves to `Closed` and tells every parked consumer the sequence ended.
    fn terminate(&self) {
        let mut inner = self.lock();
        self.set_state(&mut inner, ConnectionState::Closed);
        if let Some(handshake) = inner.handshake.take() {
            let _ = handshake.send(Err(ConnectionError::ClosedBeforeOpen));
        }

        let waiters = std::mem::take(&mut inner.waiters);
        if !waiters.is_empty() {
            debug!("Connection ended with {} pending consumers", waiters.len());
        }
        for waiter in waiters {
            let _ = waiter.send(None);
        }
    }
}

/// Transport-facing side of [`Shared`].
///
/// Holds a weak reference so an abandoned client is not kept alive by its
/// socket task; events for a dropped client are ignored.
pub(crate) struct Listener {
    shared: Weak<Shared>,
}

impl Listener {
    pub(crate) fn new(shared: &Arc<Shared>) -> Arc<Self> {
        Arc::new(Self {
            shared: Arc::downgrade(shared),
        })
    }
}

impl SocketListener for Listener {
    fn on_open(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.on_open();
        }
    }

    fn on_message(&self, payload: Payload) {
        if let Some(shared) = self.shared.upgrade() {
            shared.on_message(payload);
        }
    }

    fn on_error(&self, error: TransportError) {
        if let Some(shared) = self.shared.upgrade() {
            shared.on_error(error);
        }
    }

    fn on_close(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.on_close();
        }
    }
}
