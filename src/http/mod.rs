//! axum integration: per-route instrumentation and the status endpoint.
//!
//! ```ignore
//! let router = registry
//!     .http_muxer("http")
//!     .handle(Method::GET, "/users/:id", get_user)
//!     .handle(Method::POST, "/users", create_user)
//!     .into_router();
//! ```
//!
//! For every route and method this registers, under the namespace:
//!
//!   `<path>.<method>.time`          request latency timer
//!   `<path>.<method>.<status>.count` responses per status code
//!   `<path>.<method>.panic.count`   handler panics
//!
//! Status counters are created on the first response with that status.
//! Codes without a canonical reason phrase are counted as `0`, as are
//! requests whose handler panicked.

pub mod status;
mod timing;

use axum::handler::Handler;
use axum::http::Method;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, on, MethodFilter};
use axum::Router;
use rand::Rng;
use std::sync::Arc;

use crate::registry::Registry;
use timing::RouteStats;

/// Samples kept per route timer.
pub const ROUTE_TIMER_CAPACITY: usize = 1024;

/// Builds an axum [`Router`] whose routes record stats into a registry.
pub struct HttpMuxer<S = ()> {
    stats: Registry,
    root: Registry,
    router: Router<S>,
    sampler: Sampler,
}

impl<S> HttpMuxer<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Route stats are named under `namespace` within `registry`.
    pub fn new(registry: &Registry, namespace: &str) -> Self {
        Self {
            stats: registry.prefixed(namespace),
            root: registry.clone(),
            router: Router::new(),
            sampler: Sampler::new(registry.config().http_sample_percent),
        }
    }

    /// Adds an instrumented route.
    ///
    /// # Panics
    ///
    /// Panics when axum cannot route `method`, when the route's stats are
    /// already registered, or when axum rejects the path (for example, the
    /// same path and method added twice).
    pub fn handle<H, T>(mut self, method: Method, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        let filter = MethodFilter::try_from(method.clone())
            .unwrap_or_else(|_| panic!("cannot route {method} requests for {path}"));

        // route_layer keeps the 405 fallback, shared by every method on the
        // path, out of this route's stats
        let stats = Arc::new(RouteStats::new(&self.stats, path, &method, self.sampler));
        let route =
            on(filter, handler).route_layer(from_fn_with_state(stats, timing::instrument));

        self.router = self.router.route(path, route);
        self
    }

    pub fn get<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.handle(Method::GET, path, handler)
    }

    pub fn post<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.handle(Method::POST, path, handler)
    }

    /// Finishes the router, mounting the status endpoint on the configured
    /// `status_key` unless it is empty.
    pub fn into_router(self) -> Router<S> {
        let key = self.root.config().status_key.clone();
        if key.is_empty() {
            return self.router;
        }

        self.router
            .route(&key, get(status::status_handler).with_state(self.root))
    }
}

/// Per-request draw against `http_sample_percent`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Sampler {
    percent: u8,
}

impl Sampler {
    pub(crate) fn new(percent: u8) -> Self {
        Self { percent }
    }

    pub(crate) fn sample(&self) -> bool {
        match self.percent {
            0 => false,
            p if p >= 100 => true,
            p => rand::thread_rng().gen_range(0u8..100) < p,
        }
    }
}
