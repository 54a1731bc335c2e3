//! File-backed preference slot.
//!
//! The slot is a single file (`<data_dir>/<slot>`) holding the persona slug.
//! Saves write a sibling temp file, sync it, then rename it into place, so a
//! crash never leaves a half-written slot.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::persona::PersonaKey;

use super::PreferenceStore;

/// Default slot name inside the data directory.
pub const DEFAULT_SLOT: &str = "persona";

/// Preference store writing one slug file.
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FilePreferenceStore {
    /// Store using `<data_dir>/<slot>`.
    pub fn new(data_dir: impl AsRef<Path>, slot: &str) -> Self {
        Self {
            path: data_dir.as_ref().join(slot),
            write_lock: Mutex::new(()),
        }
    }

    /// Store using the default slot under `~/.persona-kit`.
    pub fn with_defaults() -> Self {
        let data_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".persona-kit");
        Self::new(data_dir, DEFAULT_SLOT)
    }

    /// Path of the slot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl PreferenceStore for FilePreferenceStore {
    async fn load(&self) -> Result<Option<PersonaKey>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No stored persona preference");
                return Ok(None);
            }
            Err(e) => {
                return Err(Error::PreferenceRead {
                    message: format!("{}: {}", self.path.display(), e),
                })
            }
        };

        match content.parse::<PersonaKey>() {
            Ok(persona) => {
                debug!(persona = %persona, "Loaded persona preference");
                Ok(Some(persona))
            }
            Err(reason) => {
                warn!(path = %self.path.display(), reason = %reason, "Ignoring unreadable persona preference");
                Ok(None)
            }
        }
    }

    async fn save(&self, persona: PersonaKey) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let write_err = |e: std::io::Error| Error::preference_write(persona, format!("{}: {}", self.path.display(), e));

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let temp = self.temp_path();
        if let Err(e) = write_then_rename(persona, &temp, &self.path).await {
            match fs::remove_file(&temp).await {
                Ok(()) => {}
                Err(cleanup) if cleanup.kind() == ErrorKind::NotFound => {}
                Err(cleanup) => {
                    warn!(path = %temp.display(), error = %cleanup, "Could not remove temporary preference file");
                }
            }
            return Err(write_err(e));
        }
        sync_parent(&self.path).await;

        info!(persona = %persona, path = %self.path.display(), "Persona preference saved");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(path = %self.path.display(), "Persona preference cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::IoWrite {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}

async fn write_then_rename(persona: PersonaKey, temp: &Path, target: &Path) -> std::io::Result<()> {
    let mut file = fs::File::create(temp).await?;
    file.write_all(persona.slug().as_bytes()).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(temp, target).await
}

/// Flush the directory entry created by the rename. Best effort.
async fn sync_parent(path: &Path) {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return;
    };
    let synced = match fs::File::open(parent).await {
        Ok(dir) => dir.sync_all().await,
        Err(e) => Err(e),
    };
    if let Err(e) = synced {
        debug!(path = %parent.display(), error = %e, "Could not sync preference directory");
    }
}
