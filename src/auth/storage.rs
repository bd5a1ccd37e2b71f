//! Key/value persistence behind the credential store.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::AuthError;

const STORAGE_FILE_VERSION: u32 = 1;
const STORAGE_FILE_NAME: &str = "session.toml";

/// String-keyed storage with the semantics of browser local storage.
pub trait StorageBackend: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, AuthError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), AuthError>;
    fn remove_item(&self, key: &str) -> Result<(), AuthError>;

    /// Write several keys. Backends that can should make this atomic.
    fn set_items(&self, items: &[(&str, &str)]) -> Result<(), AuthError> {
        for (key, value) in items {
            self.set_item(key, value)?;
        }
        Ok(())
    }

    /// Remove several keys.
    fn remove_items(&self, keys: &[&str]) -> Result<(), AuthError> {
        for key in keys {
            self.remove_item(key)?;
        }
        Ok(())
    }
}

/// Process-local storage; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, AuthError> {
        self.items
            .lock()
            .map_err(|_| AuthError::Io("memory storage lock poisoned".to_string()))
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), AuthError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), AuthError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn set_items(&self, items: &[(&str, &str)]) -> Result<(), AuthError> {
        let mut map = self.lock()?;
        for (key, value) in items {
            map.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}

/// File-backed storage: one versioned TOML document holding every key.
///
/// Writes go to a temp file that is renamed over the original, so a reader
/// never sees half of a multi-key update.
///
/// # Example
/// ```no_run
/// use pagedash::auth::{FileStorage, StorageBackend};
///
/// let storage = FileStorage::new(std::path::PathBuf::from("/tmp/pagedash"));
/// storage.set_item("auth_token", "abc")?;
/// # Ok::<(), pagedash::auth::AuthError>(())
/// ```
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Storage file `session.toml` inside `dir`.
    pub fn new(dir: PathBuf) -> Self {
        Self::at_path(dir.join(STORAGE_FILE_NAME))
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, AuthError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        let file: StorageFile = toml::from_str(&raw)?;
        if file.version != STORAGE_FILE_VERSION {
            return Err(AuthError::Serialization(format!(
                "unsupported storage file version {} at {}",
                file.version,
                self.path.display()
            )));
        }
        Ok(file.entries)
    }

    fn update(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), AuthError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AuthError::Io("file storage lock poisoned".to_string()))?;
        // A corrupt file is replaced rather than blocking every future write.
        let mut entries = self.read_entries().unwrap_or_else(|err| {
            tracing::warn!(path = %self.path.display(), error = %err, "discarding unreadable storage file");
            BTreeMap::new()
        });
        apply(&mut entries);
        let file = StorageFile {
            version: STORAGE_FILE_VERSION,
            saved_at: Utc::now(),
            entries,
        };
        let serialized = toml::to_string(&file)?;
        atomic_write(&self.path, serialized.as_bytes())
    }
}

impl StorageBackend for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), AuthError> {
        self.set_items(&[(key, value)])
    }

    fn remove_item(&self, key: &str) -> Result<(), AuthError> {
        self.remove_items(&[key])
    }

    fn set_items(&self, items: &[(&str, &str)]) -> Result<(), AuthError> {
        self.update(|entries| {
            for (key, value) in items {
                entries.insert(key.to_string(), value.to_string());
            }
        })
    }

    fn remove_items(&self, keys: &[&str]) -> Result<(), AuthError> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StorageFile {
    version: u32,
    saved_at: DateTime<Utc>,
    entries: BTreeMap<String, String>,
}

/// Replace `path` with `data` via a sibling temp file and a rename.
///
/// Callers hold the storage lock, so the pid-suffixed temp name is unique.
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), AuthError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| STORAGE_FILE_NAME.to_string());
    let staged = dir.join(format!(".{name}.{}.tmp", std::process::id()));
    let outcome = write_private(&staged, data).and_then(|()| fs::rename(&staged, path));
    if let Err(err) = outcome {
        let _ = fs::remove_file(&staged);
        return Err(err.into());
    }
    Ok(())
}

fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);
    let mut file = options.open(path)?;
    #[cfg(unix)]
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(data)?;
    file.sync_all()
}
