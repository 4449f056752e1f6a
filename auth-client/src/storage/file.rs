use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::KeyValueStorage;

/// JSON-file-backed storage: the map is loaded at open and written
/// through on every mutation, so entries survive process restarts.
///
/// A missing or corrupt file degrades to an empty map; write failures
/// are logged and dropped. The file is single-writer per process, there
/// is no cross-process coordination.
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStorage {
    /// Open the storage file at `path`, creating it on first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::load(&path);
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn load(path: &Path) -> HashMap<String, String> {
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Corrupt storage file, starting empty");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        }
    }

    fn persist(&self, entries: &HashMap<String, String>) {
        let json = match serde_json::to_string_pretty(entries) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize storage snapshot");
                return;
            }
        };
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = std::fs::write(&self.path, json) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to write storage file");
        }
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
            self.persist(&entries);
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            if entries.remove(key).is_some() {
                self.persist(&entries);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let storage = FileStorage::open(&path);
        storage.set("auth_token", "t1");
        storage.set("auth_user", "{\"id\":\"u1\"}");
        drop(storage);

        let reopened = FileStorage::open(&path);
        assert_eq!(reopened.get("auth_token"), Some("t1".to_string()));
        assert_eq!(reopened.get("auth_user"), Some("{\"id\":\"u1\"}".to_string()));
    }

    #[test]
    fn test_remove_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let storage = FileStorage::open(&path);
        storage.set("auth_token", "t1");
        storage.remove("auth_token");
        drop(storage);

        let reopened = FileStorage::open(&path);
        assert_eq!(reopened.get("auth_token"), None);
    }

    #[test]
    fn test_corrupt_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "not json at all").unwrap();

        let storage = FileStorage::open(&path);
        assert_eq!(storage.get("auth_token"), None);
        storage.set("auth_token", "t1");
        assert_eq!(storage.get("auth_token"), Some("t1".to_string()));
    }
}
