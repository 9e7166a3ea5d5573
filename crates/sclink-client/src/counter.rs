use std::sync::atomic::{AtomicU64, Ordering};

/// Call-id generator for outbound correlated requests.
///
/// Strictly increasing, never repeating, safe under concurrent callers.
/// Reset once per successful connection establishment, so ids are unique
/// only within a single connection's lifetime.
#[derive(Debug, Default)]
pub struct CallCounter {
    value: AtomicU64,
}

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next call id. The first call after [`reset`](Self::reset) returns 1.
    pub fn next(&self) -> u64 {
        self.value.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Rewind to 0. Invoked exactly once per connection-open, before any
    /// request is sent on that connection.
    pub fn reset(&self) {
        self.value.store(0, Ordering::SeqCst);
    }

    /// Last value handed out.
    pub fn current(&self) -> u64 {
        self.value.load(Ordering::SeqCst)
    }
}
