/// Errors that can occur while encoding or decoding wire frames.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// An outbound payload cannot be represented in the wire format.
    /// Nothing is transmitted when this is returned.
    #[error("payload encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Inbound text is not well-formed JSON.
    #[error("frame decoding failed: {0}")]
    Decode(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WireError>;
