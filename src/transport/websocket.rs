//! WebSocket transport
//!
//! Implements [`Connector`] on top of tokio-tungstenite. Each opened socket
//! is driven by its own task which:
//! - performs the handshake and reports `on_open`, or `on_error` on failure
//! - forwards every text/binary frame to the listener as a [`Payload`]
//! - reports `on_error` for protocol/I/O failures and always ends with
//!   `on_close`
//!
//! The returned [`Socket`] handle only carries the close signal. Dropping the
//! handle closes the connection as well.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio_tungstenite::connect_async;
use tracing::{debug, trace};
use tungstenite::protocol::Message as WsMessage;

use crate::transport::message::Payload;
use crate::transport::socket::{Connector, Socket, SocketListener};
use crate::utils::error::TransportError;

/// Opens `ws://` / `wss://` connections on the current tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
    fn open(
        &self,
        url: &str,
        listener: Arc<dyn SocketListener>,
    ) -> Result<Box<dyn Socket>, TransportError> {
        let runtime = Handle::try_current()
            .map_err(|e| TransportError::Refused(format!("no tokio runtime: {e}")))?;

        let (close_tx, close_rx) = oneshot::channel();
        runtime.spawn(run_socket(url.to_owned(), listener, close_rx));

        Ok(Box::new(WebSocketHandle {
            close: Some(close_tx),
        }))
    }
}

#[derive(Debug)]
struct WebSocketHandle {
    close: Option<oneshot::Sender<()>>,
}

impl Socket for WebSocketHandle {
    fn close(&mut self) -> Result<(), TransportError> {
        let close = self
            .close
            .take()
            .ok_or_else(|| TransportError::Closed("close already requested".to_string()))?;
        close
            .send(())
            .map_err(|()| TransportError::Closed("socket task has ended".to_string()))
    }
}

async fn run_socket(
    url: String,
    listener: Arc<dyn SocketListener>,
    mut close_rx: oneshot::Receiver<()>,
) {
    debug!("Connecting to {url}");

    let connecting = tokio::select! {
        res = connect_async(url.as_str()) => res,
        _ = &mut close_rx => {
            debug!("Close requested before {url} opened");
            listener.on_close();
            return;
        }
    };

    let ws_stream = match connecting {
        Ok((ws, _response)) => ws,
        Err(e) => {
            debug!("WebSocket handshake with {url} failed: {e}");
            listener.on_error(e.into());
            listener.on_close();
            return;
        }
    };

    listener.on_open();
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    loop {
        tokio::select! {
            frame = ws_receiver.next() => match frame {
                Some(Ok(WsMessage::Close(frame))) => {
                    debug!("{url} closed by broker: {frame:?}");
                    break;
                }
                Some(Ok(frame)) => {
                    if let Some(payload) = Payload::from_frame(frame) {
                        trace!("Received {} bytes from {url}", payload.len());
                        listener.on_message(payload);
                    }
                }
                Some(Err(e)) => {
                    debug!("WebSocket error on {url}: {e}");
                    listener.on_error(e.into());
                    break;
                }
                None => break,
            },
            _ = &mut close_rx => {
                debug!("Closing {url}");
                if let Err(e) = ws_sender.send(WsMessage::Close(None)).await {
                    trace!("Close frame to {url} not sent: {e}");
                }
                let _ = ws_sender.close().await;
                break;
            }
        }
    }

    listener.on_close();
}
