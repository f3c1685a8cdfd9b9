use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Keys of the values the client persists between runs.
pub mod keys {
    pub const CLIENT_ID: &str = "client_id";
    pub const CONVERSATION_ID: &str = "conversation_id";
    pub const CONVERSATION_STARTED_AT: &str = "conversation_started_at";
    pub const SUCCESSFUL_FORMAT: &str = "successful_format";
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("state file I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable key/value storage for client identity, session and format preference.
///
/// Reads never fail; a value that cannot be read is treated as absent.
/// There is no locking across processes: last writer wins.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
        Ok(())
    }
}

/// JSON object on disk, rewritten in full on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// `<config_dir>/chatlink/state.json`
    pub fn default_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("chatlink");
        config_dir.join("state.json")
    }

    /// Open (or lazily create) the state file. A missing file starts empty; an
    /// unreadable or corrupt one is logged and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = load_values(&path);
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let data = serde_json::to_string_pretty(values)?;

        // Write a private sibling file, then rename over the real one so a
        // reader never sees a half-written object.
        let tmp_path = self.tmp_path();
        let tmp_err = |source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        };
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&tmp_path)
            .map_err(tmp_err)?;
        file.write_all(data.as_bytes()).map_err(tmp_err)?;
        file.sync_all().map_err(tmp_err)?;
        drop(file);
        std::fs::rename(&tmp_path, &self.path).map_err(io_err)?;

        Ok(())
    }
}

fn load_values(path: &Path) -> BTreeMap<String, String> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "state file unreadable; starting empty");
            return BTreeMap::new();
        }
    };
    match serde_json::from_str(&data) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "state file corrupt; starting empty");
            BTreeMap::new()
        }
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        if values.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&values)
    }
}

// Unix-specific imports for file permissions
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

// No-op on non-unix (won't compile for Windows without this)
#[cfg(not(unix))]
trait OpenOptionsExt {
    fn mode(&mut self, _mode: u32) -> &mut Self;
}

#[cfg(not(unix))]
impl OpenOptionsExt for std::fs::OpenOptions {
    fn mode(&mut self, _mode: u32) -> &mut Self {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get(keys::CLIENT_ID), None);
        store.set(keys::CLIENT_ID, "client_1").unwrap();
        assert_eq!(store.get(keys::CLIENT_ID).as_deref(), Some("client_1"));
        store.remove(keys::CLIENT_ID).unwrap();
        assert_eq!(store.get(keys::CLIENT_ID), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = FileStore::open(&path);
        store.set(keys::CONVERSATION_ID, "conv-1").unwrap();
        store.set(keys::SUCCESSFUL_FORMAT, "minimal").unwrap();
        store.remove(keys::SUCCESSFUL_FORMAT).unwrap();

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get(keys::CONVERSATION_ID).as_deref(), Some("conv-1"));
        assert_eq!(reopened.get(keys::SUCCESSFUL_FORMAT), None);
    }

    #[test]
    fn corrupt_file_starts_empty_and_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileStore::open(&path);
        assert_eq!(store.get(keys::CLIENT_ID), None);
        store.set(keys::CLIENT_ID, "client_2").unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: BTreeMap<String, String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.get("client_id").map(String::as_str), Some("client_2"));
    }

    #[test]
    fn interrupted_write_leaves_previous_state_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = FileStore::open(&path);
        store.set(keys::CLIENT_ID, "client_keep").unwrap();
        store.set(keys::CONVERSATION_ID, "conv-keep").unwrap();
        assert!(!dir.path().join("state.json.tmp").exists());

        // A write killed halfway only ever touches the sibling file.
        let full = std::fs::read_to_string(&path).unwrap();
        std::fs::write(dir.path().join("state.json.tmp"), &full[..full.len() / 2]).unwrap();

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get(keys::CLIENT_ID).as_deref(), Some("client_keep"));
        assert_eq!(reopened.get(keys::CONVERSATION_ID).as_deref(), Some("conv-keep"));

        reopened.set(keys::SUCCESSFUL_FORMAT, "minimal").unwrap();
        assert!(!dir.path().join("state.json.tmp").exists());
        let again = FileStore::open(&path);
        assert_eq!(again.get(keys::CLIENT_ID).as_deref(), Some("client_keep"));
        assert_eq!(again.get(keys::SUCCESSFUL_FORMAT).as_deref(), Some("minimal"));
    }

    #[cfg(unix)]
    #[test]
    fn state_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = FileStore::open(&path);
        store.set(keys::CLIENT_ID, "client_3").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn default_path_ends_in_chatlink_state() {
        let path = FileStore::default_path();
        assert!(path.ends_with("chatlink/state.json"));
    }
}
