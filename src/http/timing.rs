use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};
use futures_util::FutureExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::panic::{resume_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

use super::{Sampler, ROUTE_TIMER_CAPACITY};
use crate::metrics::{Counter, Timer};
use crate::registry::Registry;

/// Stats for one route and method.
pub(crate) struct RouteStats {
    registry: Registry,
    path: String,
    method: String,
    sampler: Sampler,
    timer: Timer,
    panics: Counter,
    statuses: Mutex<HashMap<u16, Counter>>,
}

impl RouteStats {
    pub(crate) fn new(registry: &Registry, path: &str, method: &Method, sampler: Sampler) -> Self {
        let method = method.as_str();

        let timer = registry.timer_named(
            registry.names(&[path, method, "time"]),
            ROUTE_TIMER_CAPACITY,
        );
        let panics =
            registry.counter_named(registry.names(&[path, method, "panic", "count"]), false);

        let stats = Self {
            registry: registry.clone(),
            path: path.to_owned(),
            method: method.to_owned(),
            sampler,
            timer,
            panics,
            statuses: Mutex::new(HashMap::new()),
        };
        // status 0 always exists; it is where panics land
        stats.status_counter(0);
        stats
    }

    /// Counter for `code`, registered on first use. The map lock is held
    /// across registration so two racing requests cannot register it twice.
    fn status_counter(&self, code: u16) -> Counter {
        let mut statuses = self.statuses.lock();
        statuses
            .entry(code)
            .or_insert_with(|| {
                let code = code.to_string();
                let name = self.registry.names(&[
                    self.path.as_str(),
                    self.method.as_str(),
                    code.as_str(),
                    "count",
                ]);
                self.registry.counter_named(name, false)
            })
            .clone()
    }

    fn record(&self, status: StatusCode, elapsed: Duration) {
        self.status_counter(status_key(status)).inc();
        self.timer.add(elapsed);
    }

    fn record_panic(&self, elapsed: Duration) {
        self.status_counter(0).inc();
        self.panics.inc();
        self.timer.add(elapsed);
    }
}

/// Codes with no canonical reason phrase are folded into `0`.
fn status_key(status: StatusCode) -> u16 {
    if status.canonical_reason().is_some() {
        status.as_u16()
    } else {
        0
    }
}

/// Route middleware: times the handler, counts the response status and
/// counts panics. A panic is re-raised unchanged once recorded.
pub(crate) async fn instrument(
    State(stats): State<Arc<RouteStats>>,
    req: Request,
    next: Next,
) -> Response {
    if !stats.sampler.sample() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let outcome = AssertUnwindSafe(next.run(req)).catch_unwind().await;
    let elapsed = start.elapsed();

    match outcome {
        Ok(response) => {
            stats.record(response.status(), elapsed);
            response
        }
        Err(payload) => {
            stats.record_panic(elapsed);
            warn!(path = %stats.path, method = %stats.method, "handler panicked");
            resume_unwind(payload)
        }
    }
}
