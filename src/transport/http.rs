//! [`reqwest`]-backed implementation of [`Dispatcher`].

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::transport::message::Payload;
use crate::transport::request::{Dispatcher, Response};
use crate::utils::error::TransportError;

/// Sends one-shot messages as HTTP POST requests.
#[derive(Debug, Clone, Default)]
pub struct HttpDispatcher {
    inner: reqwest::Client,
}

impl HttpDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing client, e.g. one with custom TLS roots or proxies.
    pub fn with_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

impl From<Payload> for reqwest::Body {
    fn from(payload: Payload) -> Self {
        match payload {
            Payload::Text(text) => reqwest::Body::from(text),
            Payload::Binary(bytes) => reqwest::Body::from(bytes),
        }
    }
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
    async fn post(
        &self,
        url: &str,
        payload: Payload,
        timeout: Option<Duration>,
    ) -> Result<Response, TransportError> {
        let mut builder = self.inner.post(url).body(payload);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let resp = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Http(e)
            }
        })?;

        let status = resp.status();
        debug!("POST {url} answered {status}");
        Ok(Response::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
        ))
    }
}
