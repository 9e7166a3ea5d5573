use std::fmt;

use sclink_client::ClientError;
use sclink_transport::TransportError;
use sclink_wire::WireError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    let code = match err {
        TransportError::Connect(_) | TransportError::NotConnected => FAILURE,
        TransportError::UnsupportedData => DATA_INVALID,
        TransportError::Closed | TransportError::Disconnected => FAILURE,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn wire_error(context: &str, err: WireError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn client_error(context: &str, err: ClientError) -> CliError {
    match err {
        ClientError::Transport(err) => transport_error(context, err),
        ClientError::Wire(err) => wire_error(context, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_failures_map_to_generic_failure() {
        let err = transport_error("connect failed", TransportError::Connect("refused".into()));
        assert_eq!(err.code, FAILURE);
    }

    #[test]
    fn unsupported_data_maps_to_data_invalid() {
        let err = transport_error("receive failed", TransportError::UnsupportedData);
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn wire_faults_map_to_data_invalid() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = client_error("decode failed", ClientError::Wire(WireError::Decode(json_err)));
        assert_eq!(err.code, DATA_INVALID);
    }
}
