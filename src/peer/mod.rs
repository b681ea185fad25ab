//! The `peer` module defines how a participant of the relay is addressed.
//!
//! A [`Peer`] names a broker and an identifier on that broker. Its canonical
//! text form `{broker}/{id}` is what gets shared between peers, and it knows
//! how to build the URLs the transports connect or post to.

pub mod address;
pub mod query;

pub use address::{Peer, Scheme};
pub use query::encode_query;
