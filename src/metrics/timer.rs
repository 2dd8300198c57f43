use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::percentiles::{TimerStats, Totals};

/// Duration sample stream.
///
/// Count, sum, sum of squares, min and max are exact over the whole history.
/// Percentiles come from a ring buffer holding the last `capacity` samples;
/// once full, each new sample overwrites the oldest one.
#[derive(Debug, Clone)]
pub struct Timer {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug)]
struct Inner {
    totals: Totals,
    reservoir: Vec<u64>,
    capacity: usize,
}

impl Timer {
    /// # Panics
    ///
    /// Panics when `capacity` is zero.
    pub(crate) fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "timer reservoir capacity must be non-zero");

        Self {
            inner: Arc::new(Mutex::new(Inner {
                totals: Totals::default(),
                reservoir: Vec::with_capacity(capacity),
                capacity,
            })),
        }
    }

    /// Records one sample.
    pub fn add(&self, d: Duration) {
        let ns = u64::try_from(d.as_nanos()).unwrap_or(u64::MAX);
        self.inner.lock().record(ns);
    }

    /// Starts a measurement that is recorded when the guard drops.
    pub fn start(&self) -> TimerGuard {
        TimerGuard {
            timer: self.clone(),
            started: Instant::now(),
        }
    }

    /// Number of samples seen so far.
    pub fn count(&self) -> u64 {
        self.inner.lock().totals.count
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    /// Computes the stat set. Only the copy of the reservoir happens under
    /// the lock; sorting runs after it is released.
    pub(crate) fn read(&self) -> TimerStats {
        let (totals, mut samples) = {
            let inner = self.inner.lock();
            (inner.totals, inner.reservoir.clone())
        };
        TimerStats::from_parts(totals, &mut samples)
    }
}

impl Inner {
    fn record(&mut self, ns: u64) {
        let slot = (self.totals.count % self.capacity as u64) as usize;
        if slot < self.reservoir.len() {
            self.reservoir[slot] = ns;
        } else {
            self.reservoir.push(ns);
        }

        let t = &mut self.totals;
        if t.count == 0 {
            t.min = ns;
            t.max = ns;
        } else {
            t.min = t.min.min(ns);
            t.max = t.max.max(ns);
        }
        t.count += 1;
        t.sum = t.sum.saturating_add(ns as u128);
        t.sum_sq = t.sum_sq.saturating_add((ns as u128) * (ns as u128));
    }
}

/// Records the time since [`Timer::start`] when dropped.
#[must_use = "the measurement is recorded when the guard is dropped"]
pub struct TimerGuard {
    timer: Timer,
    started: Instant,
}

impl TimerGuard {
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.timer.add(self.started.elapsed());
    }
}
