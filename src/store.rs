use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;

const PARTIAL_SUFFIX: &str = ".partial";

/// Key under which the active record is stored.
pub const ACTIVE_RECORD_KEY: &str = "activeInspection";

/// Durable key-value persistence for the single active record. The seam
/// exists so tests and the desktop shell can supply their own backing.
trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
    fn save(&self) -> anyhow::Result<()>;
}

/// One JSON document on disk. Writes go to a `.partial` sibling first and
/// are renamed into place, so a crash never leaves a torn file.
struct FileStore {
    path: PathBuf,
    cells: Mutex<HashMap<String, String>>,
    loaded: Mutex<bool>,
}

impl FileStore {
    fn new(path: PathBuf) -> Self {
        FileStore {
            path,
            cells: Mutex::new(HashMap::new()),
            loaded: Mutex::new(false),
        }
    }

    fn ensure_loaded(&self) {
        let mut loaded = self.loaded.lock().unwrap_or_else(|e| e.into_inner());
        if *loaded {
            return;
        }
        *loaded = true;
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return,
        };
        match serde_json::from_str::<HashMap<String, String>>(&raw) {
            Ok(map) => {
                let mut cells = self.cells.lock().unwrap_or_else(|e| e.into_inner());
                *cells = map;
            }
            Err(err) => {
                tracing::warn!(
                    target: "veldkeur",
                    event = "store_file_unreadable",
                    path = %self.path.display(),
                    error = %err
                );
            }
        }
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.ensure_loaded();
        self.cells
            .lock()
            .map(|cells| cells.get(key).cloned())
            .unwrap_or_default()
    }

    fn set(&self, key: &str, value: &str) {
        self.ensure_loaded();
        if let Ok(mut cells) = self.cells.lock() {
            cells.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        self.ensure_loaded();
        if let Ok(mut cells) = self.cells.lock() {
            cells.remove(key);
        }
    }

    fn save(&self) -> anyhow::Result<()> {
        let snapshot = self
            .cells
            .lock()
            .map(|cells| cells.clone())
            .unwrap_or_default();
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("create store directory")?;
        }
        let body = serde_json::to_string(&snapshot).context("serialize store")?;
        let mut partial = self.path.as_os_str().to_owned();
        partial.push(PARTIAL_SUFFIX);
        let partial = PathBuf::from(partial);
        fs::write(&partial, body).context("write partial store file")?;
        fs::rename(&partial, &self.path).context("activate store file")?;
        Ok(())
    }
}

#[derive(Default)]
struct MemoryStore {
    data: Mutex<HashMap<String, String>>,
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.data
            .lock()
            .map(|guard| guard.get(key).cloned())
            .unwrap_or_default()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut guard) = self.data.lock() {
            guard.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut guard) = self.data.lock() {
            guard.remove(key);
        }
    }

    fn save(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<dyn SessionStore + Send + Sync>,
}

impl StoreHandle {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        StoreHandle {
            inner: Arc::new(FileStore::new(path.into())),
        }
    }

    pub fn in_memory() -> Self {
        StoreHandle {
            inner: Arc::new(MemoryStore::default()),
        }
    }

    pub fn read_active(&self) -> Option<String> {
        self.inner.get(ACTIVE_RECORD_KEY)
    }

    pub fn write_active(&self, payload: &str) {
        self.inner.set(ACTIVE_RECORD_KEY, payload);
    }

    pub fn clear_active(&self) {
        self.inner.remove(ACTIVE_RECORD_KEY);
    }

    pub fn persist(&self) -> anyhow::Result<()> {
        self.inner.save()
    }
}
