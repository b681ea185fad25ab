//! The `client` module implements a peer's connection to its broker.
//!
//! [`Client`] owns one persistent connection and reconciles messages pushed
//! by the transport with consumers pulling them through
//! [`Client::next_message`] or the [`Messages`] stream. [`Client::send`]
//! delivers a single message to another peer without any connection.

pub mod peer_client;
mod send;
mod shared;
pub mod state;
pub mod stream;

pub use peer_client::Client;
pub use send::SendOptions;
pub use state::ConnectionState;
pub use stream::{Messages, NextMessage};
