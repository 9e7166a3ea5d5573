use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::client::AckReplier;

/// Resolves one pending ack: `(event_or_channel_name, error, data)`.
pub type AckCallback = Box<dyn FnOnce(&str, Option<Value>, Option<Value>) + Send>;

/// Delivers a named event or channel push: `(name, data)`.
pub type EventCallback = Arc<dyn Fn(&str, Option<&Value>) + Send + Sync>;

/// Delivers an ack-requesting event with a bound reply path:
/// `(event_name, data, replier)`.
pub type AckEventCallback = Arc<dyn Fn(&str, Option<&Value>, AckReplier) + Send + Sync>;

/// Dispatch tables for named events, channels, pending acks, and
/// ack-capable event handlers.
///
/// Registrations are plain upserts (last write wins) keyed by exact name or
/// call id. Lookups for unregistered keys are silent no-ops: the server may
/// push on channels the client has not finished subscribing to, and newer
/// servers may emit events this client never registered. Pending acks are
/// consumed on first dispatch; a second ack for the same id is a no-op.
///
/// Event and channel registrations outlive connections; only pending acks
/// are connection-bound.
#[derive(Default)]
pub struct ListenerRegistry {
    emit_ack: HashMap<u64, (String, AckCallback)>,
    on: HashMap<String, EventCallback>,
    on_ack: HashMap<String, AckEventCallback>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_emit_ack(&mut self, id: u64, name: impl Into<String>, ack: AckCallback) {
        self.emit_ack.insert(id, (name.into(), ack));
    }

    /// Remove and return the pending ack for `id`, if any. The entry is
    /// gone afterwards regardless of what the caller does with it.
    pub fn take_emit_ack(&mut self, id: u64) -> Option<(String, AckCallback)> {
        self.emit_ack.remove(&id)
    }

    pub fn put_on(&mut self, name: impl Into<String>, listener: EventCallback) {
        self.on.insert(name.into(), listener);
    }

    pub fn get_on(&self, name: &str) -> Option<EventCallback> {
        self.on.get(name).cloned()
    }

    pub fn put_on_ack(&mut self, name: impl Into<String>, listener: AckEventCallback) {
        self.on_ack.insert(name.into(), listener);
    }

    pub fn get_on_ack(&self, name: &str) -> Option<AckEventCallback> {
        self.on_ack.get(name).cloned()
    }

    /// Whether an ack-capable handler is registered for `name`. Queried
    /// before replying: events that request an ack are delivered as plain
    /// events when no such handler exists.
    pub fn has_ack_handler(&self, name: &str) -> bool {
        self.on_ack.contains_key(name)
    }

    /// Drop all pending acks. Called when a connection opens: ids restart
    /// at 1, so acks left over from the previous connection are stale.
    pub fn clear_pending_acks(&mut self) {
        self.emit_ack.clear();
    }

    pub fn pending_ack_count(&self) -> usize {
        self.emit_ack.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    #[test]
    fn pending_ack_is_consumed_once() {
        let mut registry = ListenerRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_ack = Arc::clone(&calls);

        registry.put_emit_ack(
            7,
            "greet",
            Box::new(move |_, _, _| {
                calls_in_ack.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let (name, ack) = registry.take_emit_ack(7).expect("ack should be pending");
        assert_eq!(name, "greet");
        ack(&name, None, Some(json!("ok")));

        assert!(registry.take_emit_ack(7).is_none());
        assert_eq!(registry.pending_ack_count(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn last_registration_wins() {
        let mut registry = ListenerRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        registry.put_on("chat", Arc::new(|_, _| panic!("replaced listener must not fire")));
        let hits_in_listener = Arc::clone(&hits);
        registry.put_on(
            "chat",
            Arc::new(move |_, _| {
                hits_in_listener.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let listener = registry.get_on("chat").expect("listener should exist");
        listener("chat", None);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unregistered_lookups_are_none() {
        let registry = ListenerRegistry::new();
        assert!(registry.get_on("nope").is_none());
        assert!(registry.get_on_ack("nope").is_none());
        assert!(!registry.has_ack_handler("nope"));
    }

    #[test]
    fn clear_pending_acks_leaves_listeners_intact() {
        let mut registry = ListenerRegistry::new();
        registry.put_emit_ack(1, "a", Box::new(|_, _, _| {}));
        registry.put_on("chat", Arc::new(|_, _| {}));
        registry.put_on_ack("rpc", Arc::new(|_, _, _| {}));

        registry.clear_pending_acks();

        assert_eq!(registry.pending_ack_count(), 0);
        assert!(registry.get_on("chat").is_some());
        assert!(registry.has_ack_handler("rpc"));
    }
}
