use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, StatError};

/// Producer-specific arguments, e.g. `path` for the file producer.
pub type ProducerArgs = BTreeMap<String, String>;

// ─── Configuration ───────────────────────────────────────────────

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Time between snapshots. Zero disables the background scheduler;
    /// snapshots are then only taken through `Registry::flush`.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_interval")]
    pub snapshot_interval: Duration,

    /// Percentage of HTTP requests that get instrumented (0–100)
    #[serde(default = "default_sample_pct")]
    pub http_sample_percent: u8,

    /// Route the status endpoint is mounted on. Empty disables it.
    #[serde(default = "default_status_key")]
    pub status_key: String,

    /// Where each snapshot goes, in order
    #[serde(default)]
    pub outputs: Vec<OutputConfig>,
}

/// One output: a producer kind with its arguments, and a format kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub prod: String,
    #[serde(default)]
    pub prod_args: ProducerArgs,
    #[serde(default = "default_format")]
    pub fmt: String,
}

fn default_interval() -> Duration {
    Duration::from_secs(1)
}
fn default_sample_pct() -> u8 {
    100
}
fn default_status_key() -> String {
    "/_status".into()
}
fn default_format() -> String {
    "json".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot_interval: default_interval(),
            http_sample_percent: default_sample_pct(),
            status_key: default_status_key(),
            outputs: Vec::new(),
        }
    }
}

impl Config {
    /// Reads a JSON config file and validates it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read(path.as_ref())?;
        let cfg: Config = serde_json::from_slice(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks value ranges. Output kinds are checked when the registry is
    /// built, against the catalog it uses.
    pub fn validate(&self) -> Result<()> {
        if self.http_sample_percent > 100 {
            return Err(StatError::InvalidConfig(format!(
                "http_sample_percent must be between 0 and 100, got {}",
                self.http_sample_percent
            )));
        }
        if !self.status_key.is_empty() && !self.status_key.starts_with('/') {
            return Err(StatError::InvalidConfig(format!(
                "status_key must start with '/', got {:?}",
                self.status_key
            )));
        }
        Ok(())
    }
}
