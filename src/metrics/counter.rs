use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Signed accumulator, cloneable and shared by every clone.
///
/// With `reset_on_read` set, each snapshot read swaps the value back to zero
/// in the same atomic step, so increments racing with a snapshot land either
/// in this snapshot or the next one, never in neither.
#[derive(Debug, Clone)]
pub struct Counter {
    inner: Arc<CounterInner>,
}

#[derive(Debug)]
struct CounterInner {
    value: AtomicI64,
    reset_on_read: bool,
}

impl Counter {
    pub(crate) fn new(reset_on_read: bool) -> Self {
        Self {
            inner: Arc::new(CounterInner {
                value: AtomicI64::new(0),
                reset_on_read,
            }),
        }
    }

    pub fn inc(&self) {
        self.add(1);
    }

    pub fn dec(&self) {
        self.add(-1);
    }

    /// Adds `delta`, which may be negative.
    pub fn add(&self, delta: i64) {
        self.inner.value.fetch_add(delta, Ordering::Relaxed);
    }

    /// Current value. Never resets, regardless of `reset_on_read`.
    pub fn get(&self) -> i64 {
        self.inner.value.load(Ordering::Relaxed)
    }

    pub fn resets_on_read(&self) -> bool {
        self.inner.reset_on_read
    }

    pub(crate) fn read(&self) -> i64 {
        if self.inner.reset_on_read {
            self.inner.value.swap(0, Ordering::AcqRel)
        } else {
            self.inner.value.load(Ordering::Acquire)
        }
    }
}
