/// WebSocket close code: normal closure.
const CLOSE_NORMAL: u16 = 1000;
/// WebSocket close code: endpoint going away.
const CLOSE_GOING_AWAY: u16 = 1001;
/// WebSocket close code: unsupported data.
const CLOSE_UNSUPPORTED_DATA: u16 = 1003;

/// Errors surfaced at the transport boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// An operation was attempted before the transport was opened.
    #[error("transport is not connected")]
    NotConnected,

    /// Establishing the underlying connection failed.
    #[error("failed to establish connection: {0}")]
    Connect(String),

    /// The connection faulted without a usable close status.
    #[error("connection failed")]
    Connection,

    /// The peer went away (close code 1001).
    #[error("peer disconnected")]
    Disconnected,

    /// The connection closed normally (close code 1000).
    #[error("connection closed")]
    Closed,

    /// The peer sent a frame type the client cannot process. The protocol
    /// engine disconnects when it sees this.
    #[error("peer sent unsupported data")]
    UnsupportedData,

    /// Any other transport-level fault.
    #[error("transport error: {0}")]
    Transport(String),
}

impl TransportError {
    /// Classify a fault from the close status reported by the transport.
    ///
    /// Code 0 means no close frame was observed, which reads as a raw
    /// connection failure.
    pub fn from_close_code(code: u16) -> Self {
        match code {
            0 => Self::Connection,
            CLOSE_NORMAL => Self::Closed,
            CLOSE_GOING_AWAY => Self::Disconnected,
            CLOSE_UNSUPPORTED_DATA => Self::UnsupportedData,
            other => Self::Transport(format!("close code {other}")),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_code_classification() {
        assert!(matches!(
            TransportError::from_close_code(0),
            TransportError::Connection
        ));
        assert!(matches!(
            TransportError::from_close_code(1000),
            TransportError::Closed
        ));
        assert!(matches!(
            TransportError::from_close_code(1001),
            TransportError::Disconnected
        ));
        assert!(matches!(
            TransportError::from_close_code(1003),
            TransportError::UnsupportedData
        ));
        assert!(matches!(
            TransportError::from_close_code(1011),
            TransportError::Transport(_)
        ));
    }
}
