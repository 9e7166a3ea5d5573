//! SocketCluster protocol client engine.
//!
//! [`ScClient`] orchestrates the connection lifecycle over any
//! [`Transport`](sclink_transport::Transport): handshake on open, outbound
//! request construction with correlation ids, ordered inbound frame
//! classification, and listener dispatch.

pub mod client;
pub mod counter;
pub mod error;
pub mod registry;

pub use client::{AckReplier, ConnectionState, ScClient};
pub use counter::CallCounter;
pub use error::{ClientError, Result};
pub use registry::{AckCallback, AckEventCallback, EventCallback, ListenerRegistry};
