use serde_json::Value;

use crate::error::{Result, WireError};
use crate::message::{
    EVENT_PUBLISH, EVENT_REMOVE_AUTH_TOKEN, EVENT_SET_AUTH_TOKEN, FIELD_AUTH_TOKEN,
    FIELD_IS_AUTHENTICATED,
};

/// The inbound frame kinds a client must distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Authentication-status push (`isAuthenticated` boolean, no rid/cid).
    AuthStatus,
    /// Server push on a subscribed channel (`event == "#publish"`).
    ChannelPublish,
    /// Clear the stored auth token.
    RemoveToken,
    /// Store a new auth token.
    SetToken,
    /// Acknowledgement of an earlier request (`rid` present).
    AckResponse,
    /// Named event; ack-requesting when `cid` is also present.
    Event,
}

/// An inbound frame tagged with its kind and extracted fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedFrame {
    pub kind: FrameKind,
    pub rid: Option<u64>,
    pub cid: Option<u64>,
    pub event: Option<String>,
    pub error: Option<Value>,
    pub data: Option<Value>,
}

impl ClassifiedFrame {
    /// For [`FrameKind::ChannelPublish`]: the `{channel, data}` pair nested
    /// under `data`. `None` when the payload is not shaped as expected.
    pub fn channel_publish(&self) -> Option<(&str, Option<&Value>)> {
        let body = self.data.as_ref()?.as_object()?;
        let channel = body.get("channel")?.as_str()?;
        let data = body.get("data").filter(|v| !v.is_null());
        Some((channel, data))
    }

    /// For [`FrameKind::SetToken`]: the token string nested under `data`.
    pub fn auth_token(&self) -> Option<&str> {
        self.data.as_ref()?.get(FIELD_AUTH_TOKEN)?.as_str()
    }
}

/// Decode raw inbound text into a JSON value.
pub fn decode(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(WireError::Decode)
}

/// Parse the authentication-status boolean out of a raw frame.
pub fn is_authenticated(frame: &Value) -> Option<bool> {
    frame.get(FIELD_IS_AUTHENTICATED)?.as_bool()
}

/// Determine which message kind a decoded frame represents.
///
/// Exactly one kind is picked per frame. The precedence order below is a
/// wire-compatibility contract: a frame matching several indicators must
/// classify the same way every peer implementation classifies it.
///
/// 1. auth-status: boolean `isAuthenticated`, no `rid`, no `cid`
/// 2. channel publish: `event == "#publish"`
/// 3. remove token: `event == "#removeAuthToken"`
/// 4. set token: `event == "#setAuthToken"`, or `authToken` under `data`
///    with no `rid`/`cid`
/// 5. ack response: `rid` present, no `cid`
/// 6. event: `event` present
///
/// Frames matching none of these (including non-objects) return `None` and
/// are silently ignored, so unknown frames from newer servers are a no-op
/// rather than an error.
pub fn classify(frame: &Value) -> Option<ClassifiedFrame> {
    let obj = frame.as_object()?;

    let rid = obj.get("rid").and_then(Value::as_u64);
    let cid = obj.get("cid").and_then(Value::as_u64);
    let event = obj
        .get("event")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let error = obj.get("error").filter(|v| !v.is_null()).cloned();
    let data = obj.get("data").filter(|v| !v.is_null()).cloned();

    let uncorrelated = rid.is_none() && cid.is_none();
    let has_auth_status = uncorrelated
        && obj
            .get(FIELD_IS_AUTHENTICATED)
            .is_some_and(Value::is_boolean);
    let has_nested_token = uncorrelated
        && data
            .as_ref()
            .is_some_and(|d| d.get(FIELD_AUTH_TOKEN).is_some());

    let kind = if has_auth_status {
        FrameKind::AuthStatus
    } else if event.as_deref() == Some(EVENT_PUBLISH) {
        FrameKind::ChannelPublish
    } else if event.as_deref() == Some(EVENT_REMOVE_AUTH_TOKEN) {
        FrameKind::RemoveToken
    } else if event.as_deref() == Some(EVENT_SET_AUTH_TOKEN) || has_nested_token {
        FrameKind::SetToken
    } else if rid.is_some() && cid.is_none() {
        FrameKind::AckResponse
    } else if event.is_some() {
        FrameKind::Event
    } else {
        return None;
    };

    Some(ClassifiedFrame {
        kind,
        rid,
        cid,
        event,
        error,
        data,
    })
}
