//! Transport boundary for the sclink protocol engine.
//!
//! The protocol core consumes any bidirectional message transport through
//! the [`Transport`] trait: an ordered asynchronous sequence of inbound
//! frames plus a serialized text send path. TLS, ping/pong, and close-frame
//! plumbing live below this boundary.
//!
//! The default `websocket` feature provides [`WebSocketTransport`], built on
//! tokio-tungstenite.

pub mod error;
pub mod traits;

#[cfg(feature = "websocket")]
pub mod ws;

pub use error::{Result, TransportError};
pub use traits::{Incoming, Transport};

#[cfg(feature = "websocket")]
pub use ws::WebSocketTransport;
