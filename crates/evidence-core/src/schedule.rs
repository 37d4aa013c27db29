//! Deferred actions on a host-driven clock
//!
//! The viewer waits for the page surface to settle before mutating it.
//! Rather than owning timers, it queues actions against the host's clock
//! (milliseconds) and the host calls `take_due` from its own tick. Actions
//! are never cancelled; each carries the generation it was scheduled in and
//! the consumer drops it when the generation has moved on.

/// Monotonic counter identifying the latest page/query pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// An action waiting for its due time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deferred<T> {
    pub due_ms: u64,
    pub generation: Generation,
    pub action: T,
    seq: u64,
}

/// Queue of actions ordered by due time, FIFO among equal due times
#[derive(Debug, Clone)]
pub struct DeferredQueue<T> {
    pending: Vec<Deferred<T>>,
    next_seq: u64,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            next_seq: 0,
        }
    }
}

impl<T> DeferredQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest due time among pending actions
    pub fn next_due(&self) -> Option<u64> {
        self.pending.iter().map(|d| d.due_ms).min()
    }

    /// Queue `action` to fire `delay_ms` after `now_ms`
    pub fn schedule(&mut self, action: T, generation: Generation, now_ms: u64, delay_ms: u64) {
        let deferred = Deferred {
            due_ms: now_ms.saturating_add(delay_ms),
            generation,
            action,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.pending.push(deferred);
    }

    /// Remove and return every action due at or before `now_ms`, in order
    pub fn take_due(&mut self, now_ms: u64) -> Vec<Deferred<T>> {
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|d| d.due_ms <= now_ms);
        self.pending = pending;
        due.sort_by_key(|d| (d.due_ms, d.seq));
        due
    }
}
