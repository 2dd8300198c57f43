use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::Producer;
use crate::config::ProducerArgs;
use crate::error::{Result, StatError};

/// Catalog key.
pub const KIND: &str = "file";

/// Writes every snapshot to one file, replacing what the previous cycle
/// wrote. Missing parent directories are created.
#[derive(Debug, Clone)]
pub struct FileProducer {
    path: PathBuf,
}

impl FileProducer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the required `path` argument.
    pub fn from_args(args: &ProducerArgs) -> Result<Self> {
        let path = args.get("path").filter(|p| !p.is_empty()).ok_or_else(|| {
            StatError::MissingArg {
                producer: KIND.into(),
                arg: "path".into(),
            }
        })?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Producer for FileProducer {
    async fn write(&self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}
