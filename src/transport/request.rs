//! One-shot request contract.

use std::time::Duration;

use async_trait::async_trait;

use crate::transport::message::Payload;
use crate::utils::error::TransportError;

/// Status line of a one-shot response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub reason: String,
}

impl Response {
    pub fn new(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
        }
    }

    /// 2xx statuses count as delivered.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Delivers a single payload to a URL without keeping a connection.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// POSTs `payload` to `url`, giving up after `timeout` when one is set.
    async fn post(
        &self,
        url: &str,
        payload: Payload,
        timeout: Option<Duration>,
    ) -> Result<Response, TransportError>;
}
