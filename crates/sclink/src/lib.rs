//! SocketCluster client protocol engine.
//!
//! sclink speaks the SocketCluster JSON wire protocol over a pluggable
//! WebSocket transport: call-id correlated emits, channel pub/sub, and
//! JWT auth token lifecycle.
//!
//! # Crate Structure
//!
//! - [`transport`] — WebSocket transport abstraction and tungstenite backend
//! - [`wire`] — Outbound frame construction and inbound frame classification
//! - [`client`] — High-level protocol client with listener registry and hooks

/// Re-export transport types.
pub mod transport {
    pub use sclink_transport::*;
}

/// Re-export wire protocol types.
pub mod wire {
    pub use sclink_wire::*;
}

/// Re-export client types.
pub mod client {
    pub use sclink_client::*;
}
