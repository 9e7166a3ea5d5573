use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{Result, WireError};

/// Sent as the first message after the transport opens; carries the auth token.
pub const EVENT_HANDSHAKE: &str = "#handshake";
/// Join a named channel.
pub const EVENT_SUBSCRIBE: &str = "#subscribe";
/// Leave a named channel.
pub const EVENT_UNSUBSCRIBE: &str = "#unsubscribe";
/// Publish into a channel; also the event name on server channel pushes.
pub const EVENT_PUBLISH: &str = "#publish";
/// Server instructs the client to store a new auth token.
pub const EVENT_SET_AUTH_TOKEN: &str = "#setAuthToken";
/// Server instructs the client to clear its auth token.
pub const EVENT_REMOVE_AUTH_TOKEN: &str = "#removeAuthToken";
/// Boolean field distinguishing the authentication-status push.
pub const FIELD_IS_AUTHENTICATED: &str = "isAuthenticated";
/// Token field nested under `data` on set-token pushes.
pub const FIELD_AUTH_TOKEN: &str = "authToken";

/// Convert an application payload into a wire value.
///
/// Fails with [`WireError::Encode`] when the value cannot be represented as
/// JSON; callers abort the send in that case.
pub fn to_payload<T: Serialize>(data: &T) -> Result<Value> {
    serde_json::to_value(data).map_err(WireError::Encode)
}

/// The six outbound message shapes of the protocol.
///
/// Optional payloads project to JSON `null`, never to an omitted key —
/// peers distinguish "field absent" from "field null" and expect the latter.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    /// `{event:"#handshake", data:{authToken}, cid}`
    Handshake {
        auth_token: Option<String>,
        cid: u64,
    },
    /// `{event, data, cid}`
    Emit {
        event: String,
        data: Option<Value>,
        cid: u64,
    },
    /// `{rid, error, data}` — acknowledges a remote request. No `cid`.
    AckReply {
        rid: u64,
        error: Option<Value>,
        data: Option<Value>,
    },
    /// `{event:"#subscribe", data:{channel, data:{jwt}}, cid}`
    Subscribe {
        channel: String,
        token: Option<String>,
        cid: u64,
    },
    /// `{event:"#unsubscribe", data:channel, cid}`
    Unsubscribe { channel: String, cid: u64 },
    /// `{event:"#publish", data:{channel, data}, cid}`
    Publish {
        channel: String,
        data: Option<Value>,
        cid: u64,
    },
}

impl OutboundMessage {
    /// The call id carried by this message, if it expects correlation.
    pub fn cid(&self) -> Option<u64> {
        match self {
            Self::Handshake { cid, .. }
            | Self::Emit { cid, .. }
            | Self::Subscribe { cid, .. }
            | Self::Unsubscribe { cid, .. }
            | Self::Publish { cid, .. } => Some(*cid),
            Self::AckReply { .. } => None,
        }
    }

    /// Project to the canonical JSON wire value.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Handshake { auth_token, cid } => json!({
                "event": EVENT_HANDSHAKE,
                "data": { FIELD_AUTH_TOKEN: auth_token },
                "cid": cid,
            }),
            Self::Emit { event, data, cid } => json!({
                "event": event,
                "data": data,
                "cid": cid,
            }),
            Self::AckReply { rid, error, data } => json!({
                "rid": rid,
                "error": error,
                "data": data,
            }),
            Self::Subscribe {
                channel,
                token,
                cid,
            } => json!({
                "event": EVENT_SUBSCRIBE,
                "data": { "channel": channel, "data": { "jwt": token } },
                "cid": cid,
            }),
            Self::Unsubscribe { channel, cid } => json!({
                "event": EVENT_UNSUBSCRIBE,
                "data": channel,
                "cid": cid,
            }),
            Self::Publish { channel, data, cid } => json!({
                "event": EVENT_PUBLISH,
                "data": { "channel": channel, "data": data },
                "cid": cid,
            }),
        }
    }

    /// Serialize to wire JSON text.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.to_value()).map_err(WireError::Encode)
    }
}
