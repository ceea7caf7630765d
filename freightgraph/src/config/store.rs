//! Preference persistence.

use super::Preferences;
use crate::errors::GraphError;
use parking_lot::RwLock;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads and saves [`Preferences`].
#[cfg_attr(test, mockall::automock)]
pub trait PreferenceStore: Send + Sync {
    /// Loads preferences; missing preferences load as the default.
    fn load(&self) -> Result<Preferences, GraphError>;

    /// Saves preferences, replacing what was stored.
    fn save(&self, prefs: &Preferences) -> Result<(), GraphError>;
}

/// Keeps preferences in memory.
#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    prefs: RwLock<Preferences>,
}

impl InMemoryPreferenceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `prefs`.
    #[must_use]
    pub fn with_preferences(prefs: Preferences) -> Self {
        Self {
            prefs: RwLock::new(prefs),
        }
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn load(&self) -> Result<Preferences, GraphError> {
        Ok(self.prefs.read().clone())
    }

    fn save(&self, prefs: &Preferences) -> Result<(), GraphError> {
        *self.prefs.write() = prefs.clone();
        Ok(())
    }
}

/// Stores preferences as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFilePreferenceStore {
    path: PathBuf,
}

impl JsonFilePreferenceStore {
    /// Creates a store backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for JsonFilePreferenceStore {
    fn load(&self) -> Result<Preferences, GraphError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No stored preferences, using defaults");
                return Ok(Preferences::default());
            }
            Err(err) => return Err(err.into()),
        };
        serde_json::from_slice(&bytes).map_err(|err| {
            GraphError::Preferences(format!("{}: {err}", self.path.display()))
        })
    }

    fn save(&self, prefs: &Preferences) -> Result<(), GraphError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(prefs)?;
        std::fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), "Saved preferences");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs() -> Preferences {
        let mut prefs = Preferences::default();
        prefs.stack_after("stage/test");
        prefs.toggle_warehouse("w2");
        prefs
    }

    #[test]
    fn test_in_memory_store() {
        let store = InMemoryPreferenceStore::new();
        assert_eq!(store.load().unwrap(), Preferences::default());

        store.save(&prefs()).unwrap();
        assert_eq!(store.load().unwrap(), prefs());
    }

    #[test]
    fn test_json_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFilePreferenceStore::new(dir.path().join("nested").join("prefs.json"));

        assert_eq!(store.load().unwrap(), Preferences::default());
        store.save(&prefs()).unwrap();
        assert_eq!(store.load().unwrap(), prefs());
    }

    #[test]
    fn test_json_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, b"not json").unwrap();

        let err = JsonFilePreferenceStore::new(path.clone()).load().unwrap_err();
        assert!(matches!(err, GraphError::Preferences(_)));
    }

    #[test]
    fn test_mock_store() {
        let mut store = MockPreferenceStore::new();
        store.expect_load().times(1).returning(|| Ok(prefs()));
        store.expect_save().times(1).returning(|_| Ok(()));

        let loaded = store.load().unwrap();
        store.save(&loaded).unwrap();
        assert_eq!(loaded.stacked_after, vec!["stage/test".to_string()]);
    }
}
