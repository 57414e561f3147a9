use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// String key-value persistence collaborator. Values are JSON documents
/// owned by the caller; keys are fixed, namespaced strings.
///
/// Writes never fail from the caller's point of view: an implementation
/// that loses its backing medium degrades to memory-only operation and
/// surfaces a non-fatal warning instead.
pub trait KeyValue: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

#[derive(Default)]
pub struct MemoryKv {
    map: RwLock<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValue for MemoryKv {
    fn get(&self, key: &str) -> Option<String> {
        self.map.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.map.write().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.map.write().remove(key);
    }
}

/// File-backed store: the whole key space is one JSON object persisted
/// atomically (tempfile + rename) on every write. When the disk write
/// fails the in-memory copy stays authoritative for the session and a
/// warning is logged once per distinct failure message.
pub struct FileKv {
    path: PathBuf,
    map: RwLock<HashMap<String, String>>,
    warned: Mutex<HashSet<String>>,
}

impl FileKv {
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let map = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<HashMap<String, String>>(&text) {
                Ok(m) => m,
                Err(err) => {
                    log::warn!("discarding unreadable store file {}: {err}", path.display());
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Ok(Self {
            path,
            map: RwLock::new(map),
            warned: Mutex::new(HashSet::new()),
        })
    }

    fn persist(&self) -> std::io::Result<()> {
        let json = {
            let map = self.map.read();
            serde_json::to_vec_pretty(&*map).expect("serialize kv map")
        };
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.persist(&self.path)?;
        Ok(())
    }

    fn persist_or_warn(&self) {
        if let Err(err) = self.persist() {
            let msg = format!("store write failed, keeping data in memory: {err}");
            if self.warned.lock().insert(msg.clone()) {
                log::warn!("{msg}");
            }
        }
    }
}

impl KeyValue for FileKv {
    fn get(&self, key: &str) -> Option<String> {
        self.map.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.map.write().insert(key.to_string(), value.to_string());
        self.persist_or_warn();
    }

    fn remove(&self, key: &str) {
        self.map.write().remove(key);
        self.persist_or_warn();
    }
}
