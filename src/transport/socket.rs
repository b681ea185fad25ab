//! Persistent-connection contract.

use std::sync::Arc;

use crate::transport::message::Payload;
use crate::utils::error::TransportError;

/// Receives the lifecycle events of one persistent connection.
///
/// A transport calls [`on_open`](Self::on_open) at most once, then any number
/// of [`on_message`](Self::on_message), and finishes with
/// [`on_close`](Self::on_close). A failure is reported through
/// [`on_error`](Self::on_error) before the close. Events may be emitted from
/// any thread, including synchronously from inside [`Connector::open`] or
/// [`Socket::close`].
pub trait SocketListener: Send + Sync {
    fn on_open(&self);
    fn on_message(&self, payload: Payload);
    fn on_error(&self, error: TransportError);
    fn on_close(&self);
}

/// Handle to an opened (or opening) persistent connection.
pub trait Socket: Send {
    /// Starts shutting the connection down. The listener still receives
    /// `on_close` once the transport is done.
    fn close(&mut self) -> Result<(), TransportError>;
}

/// Opens persistent connections.
pub trait Connector: Send + Sync {
    /// Starts connecting to `url`. The listener is registered before the
    /// handle is returned, so no event can be missed.
    fn open(
        &self,
        url: &str,
        listener: Arc<dyn SocketListener>,
    ) -> Result<Box<dyn Socket>, TransportError>;
}
