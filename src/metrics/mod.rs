pub mod counter;
pub mod gauge;
pub mod name;
pub mod percentiles;
pub mod timer;

use std::sync::Arc;

pub use counter::Counter;
pub use gauge::{BoolGauge, FloatGauge, Gauge, StringGauge};
pub use name::Name;
pub use percentiles::TimerStats;
pub use timer::{Timer, TimerGuard};

/// The value a metric produced for one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Float(f64),
    Str(String),
    Timer(TimerStats),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_timer(&self) -> Option<&TimerStats> {
        match self {
            Self::Timer(v) => Some(v),
            _ => None,
        }
    }
}

/// One name/value pair inside a [`Snapshot`].
#[derive(Debug, Clone, PartialEq)]
pub struct Stat {
    pub name: Name,
    pub value: Value,
}

/// Immutable, name-sorted view of every registered metric at one instant.
/// Clones share the same backing storage.
#[derive(Debug, Clone)]
pub struct Snapshot {
    stats: Arc<[Stat]>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            stats: Arc::from(Vec::new()),
        }
    }
}

impl Snapshot {
    /// Wraps stats that are already sorted by name.
    pub(crate) fn from_sorted(stats: Vec<Stat>) -> Self {
        debug_assert!(stats.windows(2).all(|w| w[0].name < w[1].name));
        Self { stats: stats.into() }
    }

    /// Looks a stat up by its full name.
    pub fn get(&self, name: &str) -> Option<&Stat> {
        self.stats
            .binary_search_by(|s| s.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.stats[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Stat> {
        self.stats.iter()
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// True when both handles point at the same published snapshot.
    pub fn same_as(&self, other: &Snapshot) -> bool {
        Arc::ptr_eq(&self.stats, &other.stats)
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Stat;
    type IntoIter = std::slice::Iter<'a, Stat>;

    fn into_iter(self) -> Self::IntoIter {
        self.stats.iter()
    }
}

/// A registered metric handle, as the registry stores it.
#[derive(Debug, Clone)]
pub(crate) enum Metric {
    Counter(Counter),
    Gauge(Gauge),
    BoolGauge(BoolGauge),
    FloatGauge(FloatGauge),
    StringGauge(StringGauge),
    Timer(Timer),
}

impl Metric {
    /// Reads the metric for a snapshot. Reset-on-read counters clear here.
    pub(crate) fn read(&self) -> Value {
        match self {
            Self::Counter(c) => Value::Int(c.read()),
            Self::Gauge(g) => Value::Int(g.get()),
            Self::BoolGauge(g) => Value::Bool(g.get()),
            Self::FloatGauge(g) => Value::Float(g.get()),
            Self::StringGauge(g) => Value::Str(g.get()),
            Self::Timer(t) => Value::Timer(t.read()),
        }
    }
}
