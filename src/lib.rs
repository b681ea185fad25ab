//! # illchi
//!
//! `illchi` is a minimal client for the illchi message relay. A peer is
//! addressed as `{broker}/{id}`; it connects to its broker over a WebSocket
//! and pulls the messages other peers push to it. Senders that do not need
//! a connection deliver a single message with one HTTP POST.
//!
//! ## Core Modules
//!
//! - `peer`: `Peer` addressing, canonical text form and URLs.
//! - `client`: `Client` connection, message buffering and one-shot send.
//! - `transport`: the socket and request contracts plus their
//!   tokio-tungstenite and reqwest implementations.
//! - `config`: loading settings from files and the environment.
//! - `utils`: error types and logging setup.
//!
//! ```no_run
//! use illchi::{Client, Peer, SendOptions};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let me = Peer::new("relay.example.com", "42");
//! let client = Client::connect_as(me, None).await?;
//!
//! Client::send(&Peer::parse("relay.example.com/7"), "hi", SendOptions::default()).await?;
//!
//! while let Some(payload) = client.next_message().await? {
//!     println!("{payload:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod peer;
pub mod transport;
pub mod utils;

pub use client::{Client, ConnectionState, Messages, NextMessage, SendOptions};
pub use peer::{Peer, Scheme};
pub use transport::Payload;
pub use utils::error::{ClientError, ConnectionError, DeliveryError, SendError, TransportError};
