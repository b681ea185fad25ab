//! One-shot delivery: push a single message to a peer without connecting.

use std::time::Duration;

use tracing::debug;

use crate::client::peer_client::Client;
use crate::peer::{Peer, Scheme};
use crate::transport::{Dispatcher, HttpDispatcher, Payload};
use crate::utils::error::{DeliveryError, SendError};

/// Per-call settings of [`Client::send`].
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Give up when the broker has not answered in time.
    pub timeout: Option<Duration>,
    /// Encoded query string handed to the broker.
    pub query: Option<String>,
}

impl SendOptions {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }
}

impl Client {
    /// Delivers `payload` to `target` with a single HTTP POST.
    ///
    /// Fails with [`SendError::Delivery`] carrying the status code when the
    /// broker does not accept the message, and with
    /// [`SendError::Transport`] when the request itself fails or times out.
    pub async fn send(
        target: &Peer,
        payload: impl Into<Payload>,
        options: SendOptions,
    ) -> Result<(), SendError> {
        Self::send_with(&HttpDispatcher::new(), target, payload, options).await
    }

    /// Like [`Client::send`], through the given dispatcher.
    pub async fn send_with<D>(
        dispatcher: &D,
        target: &Peer,
        payload: impl Into<Payload>,
        options: SendOptions,
    ) -> Result<(), SendError>
    where
        D: Dispatcher + ?Sized,
    {
        let url = target.url(Scheme::Http, options.query.as_deref());
        debug!("Sending one-shot message to {target}");

        let response = dispatcher.post(&url, payload.into(), options.timeout).await?;
        if !response.is_success() {
            return Err(DeliveryError {
                status: response.status,
                reason: response.reason,
            }
            .into());
        }
        Ok(())
    }
}
