//! Single-slot latest-value hand-off between the landmark thread and the
//! render loop.
//!
//! Publishing overwrites whatever is in the slot; taking empties it.  There
//! is no queue, so a slow reader only ever sees the newest value and a fast
//! reader sees `None` on frames with nothing new.

use std::sync::{Arc, Mutex, MutexGuard};

struct Slot<T> {
    value:  Option<T>,
    closed: bool,
}

type Shared<T> = Arc<Mutex<Slot<T>>>;

fn lock<T>(shared: &Shared<T>) -> MutexGuard<'_, Slot<T>> {
    // A panic while holding this lock cannot leave the slot half-written.
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Writing end.
pub struct Publisher<T> {
    shared: Shared<T>,
}

/// Reading end.
pub struct Subscriber<T> {
    shared: Shared<T>,
}

/// Create a connected publisher/subscriber pair.
pub fn latest<T>() -> (Publisher<T>, Subscriber<T>) {
    let shared = Arc::new(Mutex::new(Slot { value: None, closed: false }));
    (Publisher { shared: Arc::clone(&shared) }, Subscriber { shared })
}

impl<T> Publisher<T> {
    /// Replace the slot's value.  Returns `false` once the slot is closed,
    /// in which case `value` is dropped.
    pub fn publish(&self, value: T) -> bool {
        let mut slot = lock(&self.shared);
        if slot.closed {
            return false;
        }
        slot.value = Some(value);
        true
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.shared).closed
    }
}

impl<T> Subscriber<T> {
    /// The newest value published since the last call, if any.
    pub fn take_latest(&self) -> Option<T> {
        lock(&self.shared).value.take()
    }

    /// Stop accepting values and discard anything pending.
    pub fn close(&self) {
        let mut slot = lock(&self.shared);
        slot.closed = true;
        slot.value = None;
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.shared).closed
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
