use std::future::Future;

use bytes::Bytes;

use crate::error::Result;

/// A single inbound frame delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// A text frame. Guaranteed valid UTF-8 by the transport.
    Text(String),
    /// A binary frame. The protocol engine ignores these.
    Binary(Bytes),
}

/// An established bidirectional message transport.
///
/// Implementations own the write-path serialization: `send_text` may be
/// called concurrently from any number of tasks and frames must not
/// interleave on the wire. `recv` has a single consumer (the protocol
/// engine's inbound loop) and must deliver frames strictly in arrival
/// order. Neither path imposes timeouts; those belong to the
/// implementation if anywhere.
pub trait Transport: Send + Sync {
    /// Open (or reopen) the underlying connection.
    fn open(&self) -> impl Future<Output = Result<()>> + Send;

    /// Send one text frame. Errors carry the close/fault classification
    /// current at send time.
    fn send_text(&self, text: String) -> impl Future<Output = Result<()>> + Send;

    /// Await the next inbound frame. `None` signals end-of-stream; the
    /// sequence yields nothing further after that.
    fn recv(&self) -> impl Future<Output = Option<Result<Incoming>>> + Send;

    /// Whether the connection is currently open.
    fn is_open(&self) -> bool;

    /// Close the connection. Idempotent; errors are swallowed.
    fn close(&self) -> impl Future<Output = ()> + Send;
}
