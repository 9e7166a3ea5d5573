use sclink_transport::TransportError;
use sclink_wire::WireError;

/// Errors surfaced by protocol client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Encoding or decoding a wire frame failed.
    #[error("wire error: {0}")]
    Wire(#[from] WireError),

    /// The transport reported a send or receive fault.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, ClientError>;
