//! Scratch directory for one external tool invocation.
//!
//! File I/O runs on the blocking pool; the directory is removed on drop.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

pub struct Workdir {
    dir: TempDir,
}

impl Workdir {
    /// Create a fresh scratch directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn create(prefix: &'static str) -> Result<Self> {
        let dir = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(prefix)
                .tempdir()
                .context("creating scratch directory")
        })
        .await
        .context("scratch directory task panicked")??;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    #[must_use]
    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write `contents` to `name` inside the directory and return its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn write(&self, name: &str, contents: impl Into<Vec<u8>>) -> Result<PathBuf> {
        let path = self.join(name);
        let contents = contents.into();
        let target = path.clone();
        tokio::task::spawn_blocking(move || {
            std::fs::write(&target, contents)
                .with_context(|| format!("writing {}", target.display()))
        })
        .await
        .context("write task panicked")??;
        Ok(path)
    }

    /// Read `name` back, or `None` when the tool never created it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub async fn read_optional(&self, name: &str) -> Result<Option<String>> {
        let path = self.join(name);
        tokio::task::spawn_blocking(move || read_optional_sync(&path))
            .await
            .context("read task panicked")?
    }

    /// Hand the directory over to a synchronous reader (partial state
    /// recovery) that outlives this call.
    #[must_use]
    pub fn into_inner(self) -> TempDir {
        self.dir
    }
}

/// Blocking counterpart of [`Workdir::read_optional`].
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn read_optional_sync(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}
