//! Last-write-wins gauges. No history, no aggregation: a snapshot simply
//! reads whatever was set last.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

/// Integer gauge.
#[derive(Debug, Clone, Default)]
pub struct Gauge(Arc<AtomicI64>);

impl Gauge {
    pub fn set(&self, v: i64) {
        self.0.store(v, Ordering::Release);
    }

    pub fn get(&self) -> i64 {
        self.0.load(Ordering::Acquire)
    }
}

/// Boolean gauge.
#[derive(Debug, Clone, Default)]
pub struct BoolGauge(Arc<AtomicBool>);

impl BoolGauge {
    pub fn set(&self, v: bool) {
        self.0.store(v, Ordering::Release);
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Floating point gauge, stored as raw `f64` bits.
#[derive(Debug, Clone)]
pub struct FloatGauge(Arc<AtomicU64>);

impl Default for FloatGauge {
    fn default() -> Self {
        Self(Arc::new(AtomicU64::new(0f64.to_bits())))
    }
}

impl FloatGauge {
    pub fn set(&self, v: f64) {
        self.0.store(v.to_bits(), Ordering::Release);
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }
}

/// String gauge.
#[derive(Debug, Clone, Default)]
pub struct StringGauge(Arc<RwLock<String>>);

impl StringGauge {
    pub fn set(&self, v: impl Into<String>) {
        *self.0.write() = v.into();
    }

    pub fn get(&self) -> String {
        self.0.read().clone()
    }
}
