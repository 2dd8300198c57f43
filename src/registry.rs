use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, StatError};
use crate::http::HttpMuxer;
use crate::metrics::name::normalize_prefix;
use crate::metrics::{
    BoolGauge, Counter, FloatGauge, Gauge, Metric, Name, Snapshot, Stat, StringGauge, Timer,
};
use crate::output::{Catalog, Output};
use crate::scheduler;

// ─── Public types ────────────────────────────────────────────────

/// Shared metric set plus the machinery that snapshots and publishes it.
///
/// Cloning is cheap and every clone, as well as every [`prefixed`] view,
/// refers to the same metrics, last snapshot and scheduler.
///
/// [`prefixed`]: Registry::prefixed
#[derive(Clone)]
pub struct Registry {
    shared: Arc<Shared>,
    prefix: Arc<[String]>,
}

// ─── Internal state ──────────────────────────────────────────────

pub(crate) struct Shared {
    config: Config,
    outputs: Vec<Output>,

    // Sorted by name; the lock is held for inserts and for cloning the
    // handle list, never while metrics are read
    entries: Mutex<Vec<Entry>>,

    last: RwLock<Snapshot>,

    // Serializes publish cycles so outputs never see interleaved writes
    publishing: tokio::sync::Mutex<()>,

    exit: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Clone)]
struct Entry {
    name: Name,
    metric: Metric,
}

// ─── Registry impl ───────────────────────────────────────────────

impl Registry {
    /// Builds a registry with the built-in outputs.
    ///
    /// See [`Registry::with_catalog`].
    pub fn new(config: Config, exit: CancellationToken) -> Result<Self> {
        Self::with_catalog(config, exit, &Catalog::default())
    }

    /// Validates `config`, builds every configured output from `catalog` and,
    /// when `snapshot_interval` is non-zero, starts the snapshot scheduler on
    /// the current tokio runtime.
    ///
    /// The scheduler stops when `exit` is cancelled or when
    /// [`shutdown`](Registry::shutdown) is called. Nothing is spawned when an
    /// error is returned.
    pub fn with_catalog(
        config: Config,
        exit: CancellationToken,
        catalog: &Catalog,
    ) -> Result<Self> {
        config.validate()?;

        let outputs = config
            .outputs
            .iter()
            .map(|out| catalog.build(out))
            .collect::<Result<Vec<_>>>()?;

        let runtime = if config.snapshot_interval.is_zero() {
            None
        } else {
            Some(tokio::runtime::Handle::try_current().map_err(|_| StatError::NoRuntime)?)
        };

        let interval = config.snapshot_interval;
        let shared = Arc::new(Shared {
            config,
            outputs,
            entries: Mutex::new(Vec::new()),
            last: RwLock::new(Snapshot::default()),
            publishing: tokio::sync::Mutex::new(()),
            exit: exit.child_token(),
            task: Mutex::new(None),
        });

        if let Some(rt) = runtime {
            let handle = scheduler::spawn(&rt, Arc::downgrade(&shared), interval, shared.exit.clone());
            *shared.task.lock() = Some(handle);
            info!(?interval, outputs = shared.outputs.len(), "snapshot scheduler started");
        } else {
            debug!("snapshot interval is zero, snapshots are taken on flush only");
        }

        Ok(Self {
            shared,
            prefix: Arc::from(Vec::new()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// A view that prepends `prefix` to every name it builds. Leading,
    /// trailing and repeated dots in `prefix` are dropped, so
    /// `"...a..b..."` behaves like `"a.b"`.
    pub fn prefixed(&self, prefix: &str) -> Registry {
        let mut segments = self.prefix.to_vec();
        segments.extend(normalize_prefix(prefix));

        Registry {
            shared: Arc::clone(&self.shared),
            prefix: segments.into(),
        }
    }

    /// Builds the full name for `name` under this registry's prefix.
    ///
    /// # Panics
    ///
    /// Panics when `name` is empty or blank.
    pub fn name(&self, name: &str) -> Name {
        self.names(&[name])
    }

    /// Like [`name`](Registry::name) for several segments.
    ///
    /// # Panics
    ///
    /// Panics when `parts` is empty or any part is empty or blank.
    pub fn names(&self, parts: &[&str]) -> Name {
        assert!(!parts.is_empty(), "metric name needs at least one segment");

        let segments: Vec<&str> = self
            .prefix
            .iter()
            .map(String::as_str)
            .chain(parts.iter().copied())
            .collect();
        Name::new(&segments)
    }

    // ── Registration ────────────────────────────────────────────
    //
    // All of these panic if the prefixed name is already taken anywhere in
    // the shared metric set.

    pub fn new_counter(&self, name: &str, reset_on_read: bool) -> Counter {
        let c = Counter::new(reset_on_read);
        self.register(self.name(name), Metric::Counter(c.clone()));
        c
    }

    pub fn new_gauge(&self, name: &str) -> Gauge {
        let g = Gauge::default();
        self.register(self.name(name), Metric::Gauge(g.clone()));
        g
    }

    pub fn new_bool_gauge(&self, name: &str) -> BoolGauge {
        let g = BoolGauge::default();
        self.register(self.name(name), Metric::BoolGauge(g.clone()));
        g
    }

    pub fn new_float_gauge(&self, name: &str) -> FloatGauge {
        let g = FloatGauge::default();
        self.register(self.name(name), Metric::FloatGauge(g.clone()));
        g
    }

    pub fn new_string_gauge(&self, name: &str) -> StringGauge {
        let g = StringGauge::default();
        self.register(self.name(name), Metric::StringGauge(g.clone()));
        g
    }

    /// A timer keeping the last `capacity` samples for percentiles.
    ///
    /// # Panics
    ///
    /// Also panics when `capacity` is zero.
    pub fn new_timer(&self, name: &str, capacity: usize) -> Timer {
        let t = Timer::new(capacity);
        self.register(self.name(name), Metric::Timer(t.clone()));
        t
    }

    /// Counter registered under an already-built name. Used by the HTTP layer,
    /// whose names contain route paths.
    pub(crate) fn counter_named(&self, name: Name, reset_on_read: bool) -> Counter {
        let c = Counter::new(reset_on_read);
        self.register(name, Metric::Counter(c.clone()));
        c
    }

    pub(crate) fn timer_named(&self, name: Name, capacity: usize) -> Timer {
        let t = Timer::new(capacity);
        self.register(name, Metric::Timer(t.clone()));
        t
    }

    fn register(&self, name: Name, metric: Metric) {
        let mut entries = self.shared.entries.lock();
        match entries.binary_search_by(|e| e.name.cmp(&name)) {
            Ok(_) => panic!("metric `{name}` is already registered"),
            Err(pos) => {
                debug!(%name, "registered metric");
                entries.insert(pos, Entry { name, metric });
            }
        }
    }

    /// Every registered name, sorted.
    pub fn metric_names(&self) -> Vec<Name> {
        self.shared.entries.lock().iter().map(|e| e.name.clone()).collect()
    }

    // ── Snapshots ───────────────────────────────────────────────

    /// The most recently published snapshot. Empty until the first publish;
    /// never computes a new one.
    pub fn snapshot(&self) -> Snapshot {
        self.shared.last.read().clone()
    }

    /// Runs one publish cycle now: collect, publish, write to every output.
    /// Works with or without a running scheduler. After
    /// [`shutdown`](Registry::shutdown) the snapshot is still published but
    /// outputs are skipped.
    pub async fn flush(&self) -> Snapshot {
        self.shared.publish().await
    }

    /// Reads every metric into a new snapshot without publishing it.
    /// Reset-on-read counters are cleared.
    pub(crate) fn collect(&self) -> Snapshot {
        self.shared.collect()
    }

    /// Replaces the published snapshot.
    #[cfg(test)]
    pub(crate) fn set_last(&self, snap: Snapshot) {
        *self.shared.last.write() = snap;
    }

    /// Stops the scheduler and waits for it, and for any in-flight
    /// [`flush`](Registry::flush), to finish. No output is written once this
    /// returns. Calling it again is a no-op.
    pub async fn shutdown(&self) {
        self.shared.exit.cancel();

        let task = self.shared.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "snapshot scheduler ended abnormally");
            } else {
                info!("snapshot scheduler stopped");
            }
        }

        let _cycle = self.shared.publishing.lock().await;
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.exit.is_cancelled()
    }

    /// Instruments an axum router under `namespace`.
    pub fn http_muxer<S>(&self, namespace: &str) -> HttpMuxer<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        HttpMuxer::new(self, namespace)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("prefix", &self.prefix.join("."))
            .field("metrics", &self.shared.entries.lock().len())
            .field("outputs", &self.shared.outputs)
            .finish()
    }
}

// ─── Shared impl ─────────────────────────────────────────────────

impl Shared {
    fn collect(&self) -> Snapshot {
        let entries = self.entries.lock().clone();

        let stats = entries
            .into_iter()
            .map(|e| Stat {
                value: e.metric.read(),
                name: e.name,
            })
            .collect();
        Snapshot::from_sorted(stats)
    }

    /// One publish cycle. Output writes stop as soon as shutdown starts.
    pub(crate) async fn publish(&self) -> Snapshot {
        let _cycle = self.publishing.lock().await;

        let snap = self.collect();
        *self.last.write() = snap.clone();
        debug!(stats = snap.len(), "published snapshot");

        for out in &self.outputs {
            if self.exit.is_cancelled() {
                debug!(output = out.label(), "shutting down, skipping output");
                break;
            }
            if let Err(e) = out.write(&snap).await {
                warn!(output = out.label(), error = %e, "failed to write snapshot");
            }
        }

        snap
    }
}
