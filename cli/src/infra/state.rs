//! Infrastructure implementation of the `StateStore` port.
//!
//! `FileStateStore` provides async load/save using `tokio::task::spawn_blocking`
//! with atomic write (temp file + rename) to prevent state corruption.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::ports::StateStore;
use crate::domain::StateError;
use crate::domain::state::{EnvironmentState, MIN_STATE_VERSION, STATE_FILE_NAME, STATE_VERSION};

/// Turns a (redacted) state into the bytes written to disk.
pub type Serializer = Arc<dyn Fn(&EnvironmentState) -> Result<Vec<u8>> + Send + Sync>;

/// Produces a fresh environment id.
pub type IdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Construction-time hooks of the store.
#[derive(Clone)]
pub struct StoreOptions {
    /// Version stamped on every write.
    pub version: u32,
    pub serializer: Serializer,
    pub id_generator: IdGenerator,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            serializer: Arc::new(to_tab_indented_json),
            id_generator: Arc::new(|| uuid::Uuid::new_v4().to_string()),
        }
    }
}

/// Pretty JSON indented with tabs.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_tab_indented_json(state: &EnvironmentState) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    state.serialize(&mut ser).context("serializing state")?;
    Ok(buf)
}

/// State document stored as `bbl-state.json` in one directory.
#[derive(Clone)]
pub struct FileStateStore {
    dir: PathBuf,
    options: StoreOptions,
}

impl FileStateStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_options(dir, StoreOptions::default())
    }

    #[must_use]
    pub fn with_options(dir: impl Into<PathBuf>, options: StoreOptions) -> Self {
        Self {
            dir: dir.into(),
            options,
        }
    }

    /// Path of the state document.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(STATE_FILE_NAME)
    }

    fn ensure_dir(&self) -> Result<()> {
        if self.dir.is_dir() {
            Ok(())
        } else {
            Err(StateError::DirectoryMissing(self.dir.display().to_string()).into())
        }
    }

    /// Synchronous load: used internally by `load` via `spawn_blocking`.
    fn load_sync(&self) -> Result<EnvironmentState> {
        self.ensure_dir()?;
        let path = self.path();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no state file");
                return Ok(EnvironmentState::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading state file {}", path.display()));
            }
        };
        let mut state: EnvironmentState = serde_json::from_str(&content)
            .with_context(|| format!("parsing state file {}", path.display()))?;

        if state.is_empty() {
            state.version = STATE_VERSION;
        }
        if state.version < MIN_STATE_VERSION {
            return Err(StateError::IncompatibleSchema.into());
        }
        if state.version > STATE_VERSION {
            return Err(StateError::NewerSchema {
                version: state.version,
            }
            .into());
        }

        tracing::debug!(path = %path.display(), version = state.version, "state loaded");
        Ok(state)
    }

    /// Synchronous save: used internally by `save` via `spawn_blocking`.
    fn save_sync(&self, state: &EnvironmentState) -> Result<()> {
        self.ensure_dir()?;
        let path = self.path();

        if state.is_empty() {
            return match std::fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "state file removed");
                    Ok(())
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => {
                    Err(e).with_context(|| format!("removing state file {}", path.display()))
                }
            };
        }

        let mut doc = state.without_secrets();
        doc.version = self.options.version;
        if doc.id.is_empty() {
            doc.id = existing_id(&path).unwrap_or_else(|| (self.options.id_generator)());
        }
        let content = (self.options.serializer)(&doc)?;

        // Atomic write via temp file then rename
        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, &content)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o644))
                .with_context(|| format!("setting permissions on {}", temp_path.display()))?;
        }

        std::fs::rename(&temp_path, &path)
            .with_context(|| format!("finalizing state file {}", path.display()))?;

        tracing::debug!(path = %path.display(), "state saved");
        Ok(())
    }
}

/// Id of the document already on disk, if any.
fn existing_id(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let previous: EnvironmentState = serde_json::from_str(&content).ok()?;
    Some(previous.id).filter(|id| !id.is_empty())
}

impl StateStore for FileStateStore {
    async fn load(&self) -> Result<EnvironmentState> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.load_sync())
            .await
            .context("state load task panicked")?
    }

    async fn save(&self, state: &EnvironmentState) -> Result<()> {
        let store = self.clone();
        let state = state.clone();
        tokio::task::spawn_blocking(move || store.save_sync(&state))
            .await
            .context("state save task panicked")?
    }
}
