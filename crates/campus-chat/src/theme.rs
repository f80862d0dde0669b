//! Light/dark theme and the preference store that remembers it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ChatError;

/// Preference key under which the theme is stored.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Visual class applied to the page, if any.
    pub fn css_class(&self) -> Option<&'static str> {
        match self {
            Theme::Light => None,
            Theme::Dark => Some("dark-mode"),
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Parse a stored value. Anything but `dark` reads as light.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key/value storage for user preferences that survives restarts.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ChatError>;

    fn set(&self, key: &str, value: &str) -> Result<(), ChatError>;
}

// =============================================================================
// File store
// =============================================================================

/// Preferences kept in a flat JSON object on disk.
pub struct FilePreferenceStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FilePreferenceStore {
    /// A leading `~` is expanded to the user's home directory.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: expand_home(path.as_ref()),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, ChatError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| ChatError::StorageError(format!("{}: {}", self.path.display(), e)))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| ChatError::StorageError(format!("{}: {}", self.path.display(), e)))
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, ChatError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| ChatError::StorageError(format!("Lock poisoned: {}", e)))?;
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ChatError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| ChatError::StorageError(format!("Lock poisoned: {}", e)))?;
        let mut all = self.read_all()?;
        all.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ChatError::StorageError(e.to_string()))?;
        }
        let content = serde_json::to_string_pretty(&all)
            .map_err(|e| ChatError::StorageError(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(|e| ChatError::StorageError(e.to_string()))?;
        debug!(key, path = %self.path.display(), "Preference saved");
        Ok(())
    }
}

fn expand_home(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    if raw.starts_with('~') {
        let home = std::env::var("USERPROFILE")
            .or_else(|_| std::env::var("HOME"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(raw.replacen('~', &home, 1))
    } else {
        path.to_path_buf()
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Preferences held in memory. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    values: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, ChatError> {
        let values = self
            .values
            .lock()
            .map_err(|e| ChatError::StorageError(format!("Lock poisoned: {}", e)))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ChatError> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| ChatError::StorageError(format!("Lock poisoned: {}", e)))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Read the saved theme. Storage failures fall back to light.
pub fn load_theme(store: &dyn PreferenceStore) -> Theme {
    match store.get(THEME_KEY) {
        Ok(value) => Theme::from_stored(value.as_deref()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read theme preference, using light");
            Theme::Light
        }
    }
}

pub fn save_theme(store: &dyn PreferenceStore, theme: Theme) -> Result<(), ChatError> {
    store.set(THEME_KEY, theme.as_str())?;
    info!(theme = %theme, "Theme saved");
    Ok(())
}
