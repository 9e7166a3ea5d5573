use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use sclink_transport::{Incoming, Transport, TransportError};
use sclink_wire::{classify, decode, is_authenticated, to_payload, FrameKind, OutboundMessage};

use crate::counter::CallCounter;
use crate::error::{ClientError, Result};
use crate::registry::{AckEventCallback, EventCallback, ListenerRegistry};

type ConnectHook = Arc<dyn Fn() + Send + Sync>;
type ConnectErrorHook = Arc<dyn Fn(&ClientError) + Send + Sync>;
type DisconnectHook = Arc<dyn Fn(Option<&TransportError>) + Send + Sync>;
type AuthTokenHook = Arc<dyn Fn(Option<&str>) + Send + Sync>;
type AuthStatusHook = Arc<dyn Fn(bool) + Send + Sync>;

#[derive(Default)]
struct Hooks {
    on_connect: Option<ConnectHook>,
    on_connect_error: Option<ConnectErrorHook>,
    on_disconnect: Option<DisconnectHook>,
    on_auth_token_change: Option<AuthTokenHook>,
    on_auth_status: Option<AuthStatusHook>,
}

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
}

/// Bound reply path for an ack-requesting inbound event.
///
/// Handed to the registered ack-capable handler; consuming it sends exactly
/// one `AckReply` referencing the originating request's call id.
#[derive(Debug)]
pub struct AckReplier {
    rid: u64,
    replies: mpsc::UnboundedSender<String>,
}

impl AckReplier {
    fn new(rid: u64, replies: mpsc::UnboundedSender<String>) -> Self {
        Self { rid, replies }
    }

    /// The remote call id this reply will reference.
    pub fn rid(&self) -> u64 {
        self.rid
    }

    /// Send the ack reply. At most one of `error`/`data` is meaningful;
    /// both are transmitted (as `null` when absent).
    pub fn reply(self, error: Option<Value>, data: Option<Value>) -> Result<()> {
        let text = OutboundMessage::AckReply {
            rid: self.rid,
            error,
            data,
        }
        .to_json()?;
        if self.replies.send(text).is_err() {
            debug!(rid = self.rid, "client gone, dropping ack reply");
        }
        Ok(())
    }
}

/// SocketCluster protocol client over a [`Transport`].
///
/// Owns all per-connection state: the call-id counter, the listener
/// registry, and the auth token. Multiple clients never share any of it.
/// Outbound calls may come from any number of tasks; inbound frames are
/// processed strictly in arrival order by [`run`](Self::run).
pub struct ScClient<T: Transport> {
    transport: T,
    counter: CallCounter,
    auth_token: Mutex<Option<String>>,
    registry: Mutex<ListenerRegistry>,
    hooks: Mutex<Hooks>,
    state: Mutex<ConnectionState>,
    reply_tx: mpsc::UnboundedSender<String>,
    reply_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>,
}

fn lock<S>(mutex: &Mutex<S>) -> MutexGuard<'_, S> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Transport> ScClient<T> {
    pub fn new(transport: T) -> Self {
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        Self {
            transport,
            counter: CallCounter::new(),
            auth_token: Mutex::new(None),
            registry: Mutex::new(ListenerRegistry::new()),
            hooks: Mutex::new(Hooks::default()),
            state: Mutex::new(ConnectionState::Disconnected),
            reply_tx,
            reply_rx: tokio::sync::Mutex::new(reply_rx),
        }
    }

    /// Set the auth token to offer in the next handshake.
    pub fn with_auth_token(self, token: impl Into<String>) -> Self {
        *lock(&self.auth_token) = Some(token.into());
        self
    }

    /// Borrow the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn state(&self) -> ConnectionState {
        *lock(&self.state)
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_open()
    }

    pub fn set_auth_token(&self, token: impl Into<String>) {
        *lock(&self.auth_token) = Some(token.into());
    }

    pub fn auth_token(&self) -> Option<String> {
        lock(&self.auth_token).clone()
    }

    /// Open the transport and establish the logical session.
    ///
    /// On transport open the counter is reset and the handshake goes out
    /// with `cid = 1`, carrying the current auth token. The connected hook
    /// fires after the handshake send attempt whether or not that send
    /// succeeded; a failed handshake send is returned as an ordinary send
    /// error, not a connection failure.
    pub async fn connect(&self) -> Result<()> {
        *lock(&self.state) = ConnectionState::Connecting;
        if let Err(err) = self.transport.open().await {
            *lock(&self.state) = ConnectionState::Disconnected;
            let err = ClientError::from(err);
            // Hooks are cloned out before the call so they never run under
            // the hooks lock and may re-register themselves.
            let hook = lock(&self.hooks).on_connect_error.clone();
            if let Some(hook) = hook {
                hook(&err);
            }
            return Err(err);
        }

        // Ids restart at 1 on this connection, so acks still pending from
        // the previous connection are stale and their ids about to be
        // reused; drop them together with the counter reset.
        self.counter.reset();
        lock(&self.registry).clear_pending_acks();
        *lock(&self.state) = ConnectionState::Open;

        let handshake = OutboundMessage::Handshake {
            auth_token: self.auth_token(),
            cid: self.counter.next(),
        };
        let sent = self.send_message(&handshake).await;

        let hook = lock(&self.hooks).on_connect.clone();
        if let Some(hook) = hook {
            hook();
        }
        sent
    }

    /// Reopen the transport after a disconnect and let the state machine
    /// reset. Reconnection *policy* (retry, backoff) belongs to the caller.
    pub async fn reconnect(&self) -> Result<()> {
        self.connect().await
    }

    /// Close the transport. Inbound dispatch stops; pending acks are never
    /// resolved and are discarded on the next connect.
    pub async fn disconnect(&self) {
        self.transport.close().await;
        *lock(&self.state) = ConnectionState::Disconnected;
    }

    /// Drive the inbound side of the connection until the transport
    /// reaches end-of-stream or faults.
    ///
    /// Frames are processed one at a time in arrival order; ack
    /// correlation and token state depend on that ordering. Returns the
    /// mapped close reason (also handed to the disconnect hook), or `None`
    /// for a plain end-of-stream.
    pub async fn run(&self) -> Option<TransportError> {
        let mut replies = self.reply_rx.lock().await;
        let reason = loop {
            tokio::select! {
                biased;
                reply = replies.recv() => {
                    if let Some(text) = reply {
                        // Reply-send failures are not surfaced anywhere
                        // useful; the requester simply never sees its ack.
                        if let Err(err) = self.transport.send_text(text).await {
                            warn!(error = %err, "ack reply send failed");
                        }
                    }
                }
                inbound = self.transport.recv() => {
                    // Teardown via disconnect() stops dispatch even when
                    // frames are still draining from the transport.
                    if self.state() == ConnectionState::Disconnected {
                        break None;
                    }
                    match inbound {
                        None => break None,
                        Some(Ok(Incoming::Text(text))) => self.process_text(&text),
                        Some(Ok(Incoming::Binary(payload))) => {
                            debug!(len = payload.len(), "ignoring binary frame");
                        }
                        Some(Err(TransportError::UnsupportedData)) => {
                            // The peer is sending frames we cannot process;
                            // drop the connection rather than limp along.
                            self.transport.close().await;
                            break Some(TransportError::UnsupportedData);
                        }
                        Some(Err(err)) => break Some(err),
                    }
                }
            }
        };

        // Anything still queued references this connection's ids.
        while replies.try_recv().is_ok() {}

        *lock(&self.state) = ConnectionState::Disconnected;
        let hook = lock(&self.hooks).on_disconnect.clone();
        if let Some(hook) = hook {
            hook(reason.as_ref());
        }
        reason
    }

    // ---- outbound requests ----

    /// Emit a named event without expecting an ack.
    pub async fn emit<D: Serialize>(&self, event: &str, data: Option<&D>) -> Result<()> {
        let message = OutboundMessage::Emit {
            event: event.to_owned(),
            data: encode_payload(data)?,
            cid: self.counter.next(),
        };
        self.send_message(&message).await
    }

    /// Emit a named event and register `ack` for the server's response.
    pub async fn emit_ack<D, F>(&self, event: &str, data: Option<&D>, ack: F) -> Result<()>
    where
        D: Serialize,
        F: FnOnce(&str, Option<Value>, Option<Value>) + Send + 'static,
    {
        let data = encode_payload(data)?;
        let cid = self.counter.next();
        lock(&self.registry).put_emit_ack(cid, event, Box::new(ack));
        let message = OutboundMessage::Emit {
            event: event.to_owned(),
            data,
            cid,
        };
        self.send_message(&message).await
    }

    /// Subscribe to a channel, optionally presenting a channel JWT.
    pub async fn subscribe(&self, channel: &str, token: Option<&str>) -> Result<()> {
        let message = OutboundMessage::Subscribe {
            channel: channel.to_owned(),
            token: token.map(str::to_owned),
            cid: self.counter.next(),
        };
        self.send_message(&message).await
    }

    /// Subscribe with an ack callback confirming (or refusing) the join.
    pub async fn subscribe_ack<F>(&self, channel: &str, token: Option<&str>, ack: F) -> Result<()>
    where
        F: FnOnce(&str, Option<Value>, Option<Value>) + Send + 'static,
    {
        let cid = self.counter.next();
        lock(&self.registry).put_emit_ack(cid, channel, Box::new(ack));
        let message = OutboundMessage::Subscribe {
            channel: channel.to_owned(),
            token: token.map(str::to_owned),
            cid,
        };
        self.send_message(&message).await
    }

    /// Leave a channel.
    pub async fn unsubscribe(&self, channel: &str) -> Result<()> {
        let message = OutboundMessage::Unsubscribe {
            channel: channel.to_owned(),
            cid: self.counter.next(),
        };
        self.send_message(&message).await
    }

    /// Leave a channel with an ack callback.
    pub async fn unsubscribe_ack<F>(&self, channel: &str, ack: F) -> Result<()>
    where
        F: FnOnce(&str, Option<Value>, Option<Value>) + Send + 'static,
    {
        let cid = self.counter.next();
        lock(&self.registry).put_emit_ack(cid, channel, Box::new(ack));
        let message = OutboundMessage::Unsubscribe {
            channel: channel.to_owned(),
            cid,
        };
        self.send_message(&message).await
    }

    /// Publish data into a channel.
    pub async fn publish<D: Serialize>(&self, channel: &str, data: Option<&D>) -> Result<()> {
        let message = OutboundMessage::Publish {
            channel: channel.to_owned(),
            data: encode_payload(data)?,
            cid: self.counter.next(),
        };
        self.send_message(&message).await
    }

    /// Publish into a channel with an ack callback.
    pub async fn publish_ack<D, F>(&self, channel: &str, data: Option<&D>, ack: F) -> Result<()>
    where
        D: Serialize,
        F: FnOnce(&str, Option<Value>, Option<Value>) + Send + 'static,
    {
        let data = encode_payload(data)?;
        let cid = self.counter.next();
        lock(&self.registry).put_emit_ack(cid, channel, Box::new(ack));
        let message = OutboundMessage::Publish {
            channel: channel.to_owned(),
            data,
            cid,
        };
        self.send_message(&message).await
    }

    // ---- listener registration ----

    /// Register a listener for a named event. Last registration wins.
    pub fn on<F>(&self, event: &str, listener: F)
    where
        F: Fn(&str, Option<&Value>) + Send + Sync + 'static,
    {
        lock(&self.registry).put_on(event, Arc::new(listener) as EventCallback);
    }

    /// Register a listener for channel pushes. Channels and events share
    /// the dispatch table; names are looked up exactly.
    pub fn on_channel<F>(&self, channel: &str, listener: F)
    where
        F: Fn(&str, Option<&Value>) + Send + Sync + 'static,
    {
        lock(&self.registry).put_on(channel, Arc::new(listener) as EventCallback);
    }

    /// Register an ack-capable handler for a named event. When the server
    /// emits that event with a `cid`, the handler receives an
    /// [`AckReplier`] bound to it.
    pub fn on_ack<F>(&self, event: &str, listener: F)
    where
        F: Fn(&str, Option<&Value>, AckReplier) + Send + Sync + 'static,
    {
        lock(&self.registry).put_on_ack(event, Arc::new(listener) as AckEventCallback);
    }

    // ---- lifecycle hooks ----

    pub fn set_on_connect<F: Fn() + Send + Sync + 'static>(&self, hook: F) {
        lock(&self.hooks).on_connect = Some(Arc::new(hook));
    }

    pub fn set_on_connect_error<F: Fn(&ClientError) + Send + Sync + 'static>(&self, hook: F) {
        lock(&self.hooks).on_connect_error = Some(Arc::new(hook));
    }

    pub fn set_on_disconnect<F: Fn(Option<&TransportError>) + Send + Sync + 'static>(
        &self,
        hook: F,
    ) {
        lock(&self.hooks).on_disconnect = Some(Arc::new(hook));
    }

    pub fn set_on_auth_token_change<F: Fn(Option<&str>) + Send + Sync + 'static>(&self, hook: F) {
        lock(&self.hooks).on_auth_token_change = Some(Arc::new(hook));
    }

    pub fn set_on_auth_status<F: Fn(bool) + Send + Sync + 'static>(&self, hook: F) {
        lock(&self.hooks).on_auth_status = Some(Arc::new(hook));
    }

    // ---- inbound dispatch ----

    fn process_text(&self, text: &str) {
        let value = match decode(text) {
            Ok(value) => value,
            Err(err) => {
                // Malformed frames are dropped, not fatal.
                debug!(error = %err, "dropping malformed frame");
                return;
            }
        };
        let Some(frame) = classify(&value) else {
            return;
        };

        match frame.kind {
            FrameKind::AuthStatus => {
                if let Some(flag) = is_authenticated(&value) {
                    let hook = lock(&self.hooks).on_auth_status.clone();
                    if let Some(hook) = hook {
                        hook(flag);
                    }
                }
            }
            FrameKind::ChannelPublish => {
                if let Some((channel, data)) = frame.channel_publish() {
                    let channel = channel.to_owned();
                    let data = data.cloned();
                    self.dispatch_on(&channel, data);
                }
            }
            FrameKind::RemoveToken => {
                *lock(&self.auth_token) = None;
                let hook = lock(&self.hooks).on_auth_token_change.clone();
                if let Some(hook) = hook {
                    hook(None);
                }
            }
            FrameKind::SetToken => {
                let token = frame.auth_token().map(str::to_owned);
                *lock(&self.auth_token) = token.clone();
                let hook = lock(&self.hooks).on_auth_token_change.clone();
                if let Some(hook) = hook {
                    hook(token.as_deref());
                }
            }
            FrameKind::AckResponse => {
                let Some(rid) = frame.rid else {
                    return;
                };
                // Consumed on first dispatch; unknown ids are ignored.
                let pending = lock(&self.registry).take_emit_ack(rid);
                if let Some((name, ack)) = pending {
                    ack(&name, frame.error, frame.data);
                }
            }
            FrameKind::Event => {
                let Some(event) = frame.event else {
                    return;
                };
                // The ack path needs both a registered handler and a cid;
                // otherwise the event is delivered plain and the server
                // never sees an ack for it.
                let handler = frame
                    .cid
                    .and_then(|cid| Some((lock(&self.registry).get_on_ack(&event)?, cid)));
                match handler {
                    Some((handler, cid)) => {
                        let replier = AckReplier::new(cid, self.reply_tx.clone());
                        handler(&event, frame.data.as_ref(), replier);
                    }
                    None => self.dispatch_on(&event, frame.data),
                }
            }
        }
    }

    fn dispatch_on(&self, name: &str, data: Option<Value>) {
        // Clone the listener out so application code never runs under the
        // registry lock (it may re-register from inside the callback).
        let listener = lock(&self.registry).get_on(name);
        if let Some(listener) = listener {
            listener(name, data.as_ref());
        }
    }

    async fn send_message(&self, message: &OutboundMessage) -> Result<()> {
        let text = message.to_json()?;
        self.transport.send_text(text).await?;
        Ok(())
    }
}

fn encode_payload<D: Serialize>(data: Option<&D>) -> Result<Option<Value>> {
    match data {
        Some(data) => Ok(Some(to_payload(data)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn encode_payload_maps_values_and_absence() {
        assert_eq!(encode_payload::<Value>(None).unwrap(), None);
        assert_eq!(
            encode_payload(Some(&json!({"x": 1}))).unwrap(),
            Some(json!({"x": 1}))
        );
    }

    #[test]
    fn ack_replier_builds_reply_frame() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let replier = AckReplier::new(5, tx);
        assert_eq!(replier.rid(), 5);
        replier
            .reply(None, Some(json!("done")))
            .expect("reply should encode");

        let text = rx.try_recv().expect("reply should be queued");
        let value: Value = serde_json::from_str(&text).expect("reply should be JSON");
        assert_eq!(value, json!({"rid": 5, "error": null, "data": "done"}));
    }

    #[test]
    fn ack_replier_tolerates_closed_queue() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let replier = AckReplier::new(1, tx);
        replier
            .reply(None, None)
            .expect("closed queue is not an error");
    }
}
