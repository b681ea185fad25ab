//! Pull side of a client: the single-message future and the message stream.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::oneshot;

use crate::client::shared::Shared;
use crate::transport::Payload;
use crate::utils::error::ClientError;

/// Future returned by [`Client::next_message`](crate::client::Client::next_message).
///
/// Resolves to `Ok(Some(payload))` for the next message, `Ok(None)` once the
/// connection has ended, or `Err(ClientError::NotConnected)` when the client
/// was not open at call time. Dropping it gives up its place in line; the
/// message it would have received goes to the next consumer instead, even
/// when it had already been handed over but not yet polled out.
#[derive(Debug)]
#[must_use = "futures do nothing unless awaited"]
pub struct NextMessage {
    inner: Pending,
}

#[derive(Debug)]
enum Pending {
    Ready(Option<Result<Option<Payload>, ClientError>>),
    Waiting {
        rx: oneshot::Receiver<Option<Payload>>,
        shared: Weak<Shared>,
    },
}

impl NextMessage {
    pub(crate) fn ready(result: Result<Option<Payload>, ClientError>) -> Self {
        Self {
            inner: Pending::Ready(Some(result)),
        }
    }

    pub(crate) fn waiting(rx: oneshot::Receiver<Option<Payload>>, shared: Weak<Shared>) -> Self {
        Self {
            inner: Pending::Waiting { rx, shared },
        }
    }
}

impl Drop for NextMessage {
    fn drop(&mut self) {
        let Pending::Waiting { rx, shared } = &mut self.inner else {
            return;
        };

        rx.close();
        // delivered but never polled out: hand it back to the client
        if let Ok(Some(payload)) = rx.try_recv() {
            if let Some(shared) = shared.upgrade() {
                shared.redeliver(payload);
            }
        }
    }
}

impl Future for NextMessage {
    type Output = Result<Option<Payload>, ClientError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().inner {
            Pending::Ready(result) => Poll::Ready(result.take().unwrap_or(Ok(None))),
            // a dropped sender means the client itself is gone
            Pending::Waiting { rx, .. } => {
                Pin::new(rx).poll(cx).map(|res| Ok(res.unwrap_or(None)))
            }
        }
    }
}

/// Stream of every message a client receives, see
/// [`Client::messages`](crate::client::Client::messages).
///
/// Ends when the connection ends. If the client is not open when a message
/// is requested the stream yields `Err(ClientError::NotConnected)` once and
/// then ends.
#[derive(Debug)]
#[must_use = "streams do nothing unless polled"]
pub struct Messages {
    shared: Arc<Shared>,
    pending: Option<NextMessage>,
    done: bool,
}

impl Messages {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            pending: None,
            done: false,
        }
    }
}

impl Stream for Messages {
    type Item = Result<Payload, ClientError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        let shared = &this.shared;
        let next = this.pending.get_or_insert_with(|| shared.next_message());
        let result = match Pin::new(next).poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(result) => result,
        };
        this.pending = None;

        match result {
            Ok(Some(payload)) => Poll::Ready(Some(Ok(payload))),
            Ok(None) => {
                this.done = true;
                Poll::Ready(None)
            }
            Err(e) => {
                this.done = true;
                Poll::Ready(Some(Err(e)))
            }
        }
    }
}
