//! Snapshot outputs.
//!
//! An output pairs a [`Format`] (snapshot to bytes) with a [`Producer`]
//! (bytes to somewhere). Both are picked by string key from a [`Catalog`],
//! so configs can name them and applications can plug in their own.

pub mod file;
pub mod json;

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::{OutputConfig, ProducerArgs};
use crate::error::{Result, StatError};
use crate::metrics::Snapshot;

pub use file::FileProducer;
pub use json::JsonFormat;

/// Serializes a snapshot.
pub trait Format: Send + Sync {
    fn encode(&self, snap: &Snapshot) -> Result<Vec<u8>>;
}

/// Delivers encoded bytes to a destination.
#[async_trait]
pub trait Producer: Send + Sync {
    async fn write(&self, bytes: &[u8]) -> Result<()>;
}

type FormatCtor = Arc<dyn Fn() -> Box<dyn Format> + Send + Sync>;
type ProducerCtor = Arc<dyn Fn(&ProducerArgs) -> Result<Box<dyn Producer>> + Send + Sync>;

/// Lookup table from config keys to format and producer constructors.
///
/// `Catalog::default()` knows `"json"` and `"file"`.
#[derive(Clone)]
pub struct Catalog {
    formats: HashMap<String, FormatCtor>,
    producers: HashMap<String, ProducerCtor>,
}

impl Catalog {
    /// A catalog with nothing registered.
    pub fn empty() -> Self {
        Self {
            formats: HashMap::new(),
            producers: HashMap::new(),
        }
    }

    pub fn register_format<F>(&mut self, kind: impl Into<String>, ctor: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Format> + Send + Sync + 'static,
    {
        self.formats.insert(kind.into(), Arc::new(ctor));
        self
    }

    pub fn register_producer<F>(&mut self, kind: impl Into<String>, ctor: F) -> &mut Self
    where
        F: Fn(&ProducerArgs) -> Result<Box<dyn Producer>> + Send + Sync + 'static,
    {
        self.producers.insert(kind.into(), Arc::new(ctor));
        self
    }

    pub fn has_format(&self, kind: &str) -> bool {
        self.formats.contains_key(kind)
    }

    pub fn has_producer(&self, kind: &str) -> bool {
        self.producers.contains_key(kind)
    }

    /// Builds the output described by `cfg`, failing on unknown kinds or
    /// producer arguments the producer rejects.
    pub fn build(&self, cfg: &OutputConfig) -> Result<Output> {
        let new_producer = self
            .producers
            .get(&cfg.prod)
            .ok_or_else(|| StatError::UnknownProducer(cfg.prod.clone()))?;
        let new_format = self
            .formats
            .get(&cfg.fmt)
            .ok_or_else(|| StatError::UnknownFormat(cfg.fmt.clone()))?;

        Ok(Output {
            label: format!("{}:{}", cfg.prod, cfg.fmt),
            format: new_format(),
            producer: new_producer(&cfg.prod_args)?,
        })
    }
}

impl Default for Catalog {
    fn default() -> Self {
        let mut catalog = Self::empty();
        catalog
            .register_format(json::KIND, || Box::new(JsonFormat) as Box<dyn Format>)
            .register_producer(file::KIND, |args| {
                Ok(Box::new(FileProducer::from_args(args)?) as Box<dyn Producer>)
            });
        catalog
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formats: Vec<_> = self.formats.keys().collect();
        let mut producers: Vec<_> = self.producers.keys().collect();
        formats.sort();
        producers.sort();
        f.debug_struct("Catalog")
            .field("formats", &formats)
            .field("producers", &producers)
            .finish()
    }
}

/// A configured format/producer pair.
pub struct Output {
    label: String,
    format: Box<dyn Format>,
    producer: Box<dyn Producer>,
}

impl Output {
    /// `"<producer>:<format>"`, used in logs.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub async fn write(&self, snap: &Snapshot) -> Result<()> {
        let bytes = self.format.encode(snap)?;
        self.producer.write(&bytes).await
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output").field("label", &self.label).finish()
    }
}
