use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::Settings;
use crate::error::ReplybotError;

/// Holds the live settings snapshot and persists admin edits.
///
/// Readers clone the `Arc` and keep it for as long as they need; a save
/// writes the file first and only then swaps the pointer, so no reader ever
/// sees a partially applied edit.
pub struct SettingsStore {
    path: PathBuf,
    current: RwLock<Arc<Settings>>,
    /// Serializes saves so file order matches swap order.
    save_lock: Mutex<()>,
}

impl SettingsStore {
    /// Load settings from `path`. A missing file yields defaults.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ReplybotError> {
        let path = path.into();
        let settings = if path.exists() {
            let settings = load(&path)?;
            info!(
                "Settings loaded from {} ({} rules, {} templates)",
                path.display(),
                settings.keywords.len(),
                settings.flex_templates.len()
            );
            settings
        } else {
            warn!(
                "Settings file not found at {}, using defaults",
                path.display()
            );
            Settings::default()
        };
        Ok(Self::with_settings(path, settings))
    }

    /// Wrap already-built settings; `path` is where saves go.
    pub fn with_settings(path: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(Arc::new(settings)),
            save_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<Settings> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Merge a partial document into the current settings, persist, then swap.
    ///
    /// On any failure the in-memory snapshot is left untouched.
    pub async fn save(&self, patch: Value) -> Result<Arc<Settings>, ReplybotError> {
        let _guard = self.save_lock.lock().await;

        let next = self.snapshot().merged(patch)?;
        let body = serde_json::to_string_pretty(&next)?;
        write_atomic(&self.path, body.as_bytes()).await?;

        let next = Arc::new(next);
        {
            let mut current = self.current.write().unwrap_or_else(|e| e.into_inner());
            *current = Arc::clone(&next);
        }
        info!(
            "Settings saved to {} ({} rules)",
            self.path.display(),
            next.keywords.len()
        );
        Ok(next)
    }
}

/// Read, migrate, and validate a settings file.
pub(crate) fn load(path: &Path) -> Result<Settings, ReplybotError> {
    let content = std::fs::read_to_string(path)?;
    let raw: Value = serde_json::from_str(&content)?;
    Ok(Settings::from_value(raw)?)
}

/// Write to a sibling temp file, then rename over the target.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ReplybotError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes).await?;
    match tokio::fs::rename(&tmp, path).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = tokio::fs::remove_file(&tmp).await;
            Err(e.into())
        }
    }
}
