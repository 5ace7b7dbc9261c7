//! Durable key-value storage for the API key and conversation history.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::debug;

use crate::error::StoreError;
use crate::state::ChatMessage;

const API_KEY: &str = "api_key";
const HISTORY: &str = "conversation_history";

/// Persistence boundary. Absent values come back as `None`.
pub trait Store: Send {
    fn api_key(&self) -> Result<Option<String>, StoreError>;
    fn set_api_key(&mut self, key: &str) -> Result<(), StoreError>;
    fn remove_api_key(&mut self) -> Result<(), StoreError>;

    fn load_history(&self) -> Result<Option<Vec<ChatMessage>>, StoreError>;
    fn save_history(&mut self, history: &[ChatMessage]) -> Result<(), StoreError>;
    fn remove_history(&mut self) -> Result<(), StoreError>;
}

/// JSON object file holding every key, rewritten on each change.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/sitepm/state.json`
    pub fn open_default() -> Result<Self, StoreError> {
        let dir = dirs::data_dir().ok_or(StoreError::NoDataDir)?;
        Ok(Self::new(dir.join("sitepm").join("state.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, Value>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| StoreError::Io(self.path.display().to_string(), e))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write(&self, map: &BTreeMap<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError::Io(parent.display().to_string(), e))?;
        }
        let content = serde_json::to_string_pretty(map)?;
        fs::write(&self.path, content)
            .map_err(|e| StoreError::Io(self.path.display().to_string(), e))?;
        debug!(path = %self.path.display(), "store written");
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, Value>)) -> Result<(), StoreError> {
        let mut map = self.read()?;
        f(&mut map);
        self.write(&map)
    }
}

impl Store for FileStore {
    fn api_key(&self) -> Result<Option<String>, StoreError> {
        Ok(self
            .read()?
            .get(API_KEY)
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    fn set_api_key(&mut self, key: &str) -> Result<(), StoreError> {
        self.update(|map| {
            map.insert(API_KEY.to_string(), Value::String(key.to_string()));
        })
    }

    fn remove_api_key(&mut self) -> Result<(), StoreError> {
        self.update(|map| {
            map.remove(API_KEY);
        })
    }

    fn load_history(&self) -> Result<Option<Vec<ChatMessage>>, StoreError> {
        match self.read()?.remove(HISTORY) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn save_history(&mut self, history: &[ChatMessage]) -> Result<(), StoreError> {
        let value = serde_json::to_value(history)?;
        self.update(|map| {
            map.insert(HISTORY.to_string(), value);
        })
    }

    fn remove_history(&mut self) -> Result<(), StoreError> {
        self.update(|map| {
            map.remove(HISTORY);
        })
    }
}

/// In-process store. Clones share the same contents.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    api_key: Option<String>,
    history: Option<Vec<ChatMessage>>,
}

impl MemoryStore {
    pub fn with_api_key(key: &str) -> Self {
        let store = Self::default();
        store.inner.lock().unwrap().api_key = Some(key.to_string());
        store
    }
}

impl Store for MemoryStore {
    fn api_key(&self) -> Result<Option<String>, StoreError> {
        Ok(self.inner.lock().unwrap().api_key.clone())
    }

    fn set_api_key(&mut self, key: &str) -> Result<(), StoreError> {
        self.inner.lock().unwrap().api_key = Some(key.to_string());
        Ok(())
    }

    fn remove_api_key(&mut self) -> Result<(), StoreError> {
        self.inner.lock().unwrap().api_key = None;
        Ok(())
    }

    fn load_history(&self) -> Result<Option<Vec<ChatMessage>>, StoreError> {
        Ok(self.inner.lock().unwrap().history.clone())
    }

    fn save_history(&mut self, history: &[ChatMessage]) -> Result<(), StoreError> {
        self.inner.lock().unwrap().history = Some(history.to_vec());
        Ok(())
    }

    fn remove_history(&mut self) -> Result<(), StoreError> {
        self.inner.lock().unwrap().history = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("state.json"));
        (dir, store)
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let (_dir, store) = temp_store();
        assert_eq!(store.api_key().unwrap(), None);
        assert_eq!(store.load_history().unwrap(), None);
    }

    #[test]
    fn test_api_key_round_trip() {
        let (_dir, mut store) = temp_store();
        store.set_api_key("sk-or-1").unwrap();
        assert_eq!(store.api_key().unwrap().as_deref(), Some("sk-or-1"));
        store.remove_api_key().unwrap();
        assert_eq!(store.api_key().unwrap(), None);
    }

    #[test]
    fn test_history_is_independent_of_key() {
        let (_dir, mut store) = temp_store();
        store.set_api_key("k").unwrap();
        store
            .save_history(&[ChatMessage::user("q"), ChatMessage::assistant("a")])
            .unwrap();

        let reopened = FileStore::new(store.path());
        assert_eq!(reopened.load_history().unwrap().unwrap().len(), 2);

        store.remove_history().unwrap();
        assert_eq!(store.load_history().unwrap(), None);
        assert_eq!(store.api_key().unwrap().as_deref(), Some("k"));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let (_dir, store) = temp_store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.load_history(), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_memory_store_clones_share_state() {
        let mut a = MemoryStore::default();
        let b = a.clone();
        a.set_api_key("shared").unwrap();
        assert_eq!(b.api_key().unwrap().as_deref(), Some("shared"));
    }
}
