//! In-process stats: counters, gauges and timers that are snapshotted on a
//! fixed interval, written to pluggable outputs and served as JSON.
//!
//! ```ignore
//! let exit = CancellationToken::new();
//! let stats = Registry::new(Config::default(), exit.clone())?;
//!
//! let hits = stats.new_counter("cache.hits", true);
//! let lookups = stats.new_timer("cache.lookup", 512);
//!
//! hits.inc();
//! lookups.add(elapsed);
//!
//! let app = stats.http_muxer("http").get("/users/:id", get_user).into_router();
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod output;
pub mod registry;
mod scheduler;

pub use config::{Config, OutputConfig, ProducerArgs};
pub use error::{Result, StatError};
pub use http::HttpMuxer;
pub use metrics::{
    BoolGauge, Counter, FloatGauge, Gauge, Name, Snapshot, Stat, StringGauge, Timer, TimerStats,
    Value,
};
pub use output::{Catalog, FileProducer, Format, JsonFormat, Output, Producer};
pub use registry::Registry;
