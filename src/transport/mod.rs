//! The `transport` module holds the collaborators the client talks through.
//!
//! The client core never touches a socket or an HTTP stack directly. It
//! depends on two small contracts:
//!
//! - [`Connector`] opens a persistent connection and reports its lifecycle to
//!   a [`SocketListener`] (open, message, error, close).
//! - [`Dispatcher`] performs a single one-shot POST and reports the status.
//!
//! [`WebSocketConnector`] (tokio-tungstenite) and [`HttpDispatcher`]
//! (reqwest) are the defaults; tests and embedders can substitute their own.

pub mod http;
pub mod message;
pub mod request;
pub mod socket;
pub mod websocket;

pub use http::HttpDispatcher;
pub use message::Payload;
pub use request::{Dispatcher, Response};
pub use socket::{Connector, Socket, SocketListener};
pub use websocket::WebSocketConnector;

#[cfg(test)]
mod tests;
