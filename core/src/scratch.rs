use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tempfile::TempDir;

/// Per-invocation temporary directory for compiled programs and intermediate
/// files. Removed when dropped.
#[derive(Debug)]
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    const PREFIX: &str = "jdg_";

    pub fn new() -> anyhow::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(Self::PREFIX)
            .tempdir()
            .context("Failed to create scratch directory")?;
        log::debug!("Scratch dir: {}", dir.path().to_string_lossy());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, filename: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(filename)
    }

    /// Remove the directory now, reporting failures instead of ignoring them.
    pub fn close(self) -> anyhow::Result<()> {
        let path = self.dir.path().to_owned();
        self.dir
            .close()
            .with_context(|| format!("Failed to remove scratch dir {}", path.to_string_lossy()))
    }
}
