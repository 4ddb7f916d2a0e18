use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::model::record::Record;
use crate::model::settings::Settings;

pub const RECORDS_KEY: &str = "organizer:records";
pub const SETTINGS_KEY: &str = "organizer:settings";

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: io::Error,
    },
    #[error("could not serialize {key}: {source}")]
    SerializeError {
        key: &'static str,
        source: serde_json::Error,
    },
    #[error("io error: {0}")]
    IoError(#[from] io::Error),
}

/// A string key-value store holding one document per key.
///
/// Reads are infallible by contract: a missing or unreadable entry is `None`.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StoreError::WriteError {
            path: dir.clone(),
            source: e,
        })?;
        Ok(FileStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `organizer:records` → `<dir>/organizer-records.json`
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        atomic_write(&path, value.as_bytes()).map_err(|e| StoreError::WriteError { path, source: e })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::IoError(e)),
        }
    }
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Load the record collection. A missing or unparseable document is an
/// empty collection.
pub fn load_records<S: KeyValueStore + ?Sized>(store: &S) -> Vec<Record> {
    let Some(text) = store.get(RECORDS_KEY) else {
        return Vec::new();
    };
    match serde_json::from_str(&text) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(error = %e, "stored records unreadable, starting empty");
            Vec::new()
        }
    }
}

pub fn save_records<S: KeyValueStore + ?Sized>(store: &mut S, records: &[Record]) -> Result<(), StoreError> {
    let text = serde_json::to_string(records).map_err(|e| StoreError::SerializeError {
        key: RECORDS_KEY,
        source: e,
    })?;
    store.set(RECORDS_KEY, &text)
}

/// Load saved settings, or `None` when nothing usable is stored
pub fn load_settings<S: KeyValueStore + ?Sized>(store: &S) -> Option<Settings> {
    let text = store.get(SETTINGS_KEY)?;
    match serde_json::from_str(&text) {
        Ok(settings) => Some(settings),
        Err(e) => {
            tracing::warn!(error = %e, "stored settings unreadable, using defaults");
            None
        }
    }
}

pub fn save_settings<S: KeyValueStore + ?Sized>(store: &mut S, settings: &Settings) -> Result<(), StoreError> {
    let text = serde_json::to_string(settings).map_err(|e| StoreError::SerializeError {
        key: SETTINGS_KEY,
        source: e,
    })?;
    store.set(SETTINGS_KEY, &text)
}

/// Remove both documents
pub fn clear_all<S: KeyValueStore + ?Sized>(store: &mut S) -> Result<(), StoreError> {
    store.remove(RECORDS_KEY)?;
    store.remove(SETTINGS_KEY)
}
