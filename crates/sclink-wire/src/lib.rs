//! SocketCluster wire protocol: message shapes and inbound classification.
//!
//! Everything here is transport-independent. Outbound messages are built as
//! typed values and projected to JSON text; inbound JSON objects are tagged
//! with exactly one [`FrameKind`] using a fixed precedence order that peers
//! rely on.

pub mod classify;
pub mod error;
pub mod message;

pub use classify::{classify, decode, is_authenticated, ClassifiedFrame, FrameKind};
pub use error::{Result, WireError};
pub use message::{
    to_payload, OutboundMessage, EVENT_HANDSHAKE, EVENT_PUBLISH, EVENT_REMOVE_AUTH_TOKEN,
    EVENT_SET_AUTH_TOKEN, EVENT_SUBSCRIBE, EVENT_UNSUBSCRIBE, FIELD_AUTH_TOKEN,
    FIELD_IS_AUTHENTICATED,
};
