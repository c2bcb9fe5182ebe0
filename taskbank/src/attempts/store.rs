//! @ai:module:intent Persist attempt records keyed by client, exercise and language
//! @ai:module:layer infrastructure
//! @ai:module:public_api AttemptKey, AttemptStore, MemoryStore, FileStore
//! @ai:module:stateless false

use crate::attempts::tracker::AttemptRecord;
use crate::error::{Error, Result};
use crate::runner::Language;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// @ai:intent Identifies one lockout counter
///
/// `client` is opaque: a session id, user name or address supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptKey {
    pub client: String,
    pub exercise_id: String,
    pub language: Language,
}

impl AttemptKey {
    pub fn new(client: impl Into<String>, exercise_id: impl Into<String>, language: Language) -> Self {
        Self {
            client: client.into(),
            exercise_id: exercise_id.into(),
            language,
        }
    }
}

impl std::fmt::Display for AttemptKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.client, self.exercise_id, self.language)
    }
}

/// @ai:intent Storage for attempt records
///
/// Callers serialize read-modify-write sequences themselves; a store only
/// guarantees that each `get` and `put` is atomic.
#[allow(async_fn_in_trait)]
pub trait AttemptStore: Send + Sync {
    /// @ai:intent Fetch the stored record, if the key has one
    async fn get(&self, key: &AttemptKey) -> Result<Option<AttemptRecord>>;

    /// @ai:intent Replace the record for a key
    async fn put(&self, key: &AttemptKey, record: AttemptRecord) -> Result<()>;
}

/// @ai:intent Process-local store for servers and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<AttemptKey, AttemptRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AttemptStore for MemoryStore {
    async fn get(&self, key: &AttemptKey) -> Result<Option<AttemptRecord>> {
        Ok(self.records.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &AttemptKey, record: AttemptRecord) -> Result<()> {
        self.records.lock().await.insert(key.clone(), record);
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateDocument {
    #[serde(default)]
    records: Vec<StoredRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    key: AttemptKey,
    #[serde(flatten)]
    record: AttemptRecord,
}

/// @ai:intent JSON file store so lockouts survive between CLI invocations
///
/// Writers take an exclusive advisory lock on `<state file>.lock` for the whole
/// read-modify-write, so separate processes sharing one state file never drop
/// each other's records. The file itself is only ever replaced by rename, which
/// lets readers skip the lock.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// @ai:intent Sidecar file holding the advisory writer lock
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn parent_dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    /// @ai:intent Read every record; a missing file is an empty store
    /// @ai:effects fs:read
    fn load(&self) -> Result<HashMap<AttemptKey, AttemptRecord>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }

        let document: StateDocument = serde_json::from_str(&content).map_err(|e| {
            Error::Store(format!("corrupt state file {}: {}", self.path.display(), e))
        })?;

        Ok(document
            .records
            .into_iter()
            .map(|stored| (stored.key, stored.record))
            .collect())
    }

    /// @ai:intent Write every record through a uniquely named staging file, then rename it over the state file
    /// @ai:effects fs:write
    fn store(&self, records: HashMap<AttemptKey, AttemptRecord>) -> Result<()> {
        let mut records: Vec<StoredRecord> = records
            .into_iter()
            .map(|(key, record)| StoredRecord { key, record })
            .collect();
        records.sort_by(|a, b| a.key.to_string().cmp(&b.key.to_string()));

        let content = serde_json::to_string_pretty(&StateDocument { records })?;

        let mut staging = tempfile::NamedTempFile::new_in(self.parent_dir())?;
        staging.write_all(content.as_bytes())?;
        staging.as_file().sync_all()?;
        staging.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    /// @ai:intent Load, apply one insert and store while holding the writer lock
    /// @ai:effects fs:read, fs:write
    fn put_locked(&self, key: AttemptKey, record: AttemptRecord) -> Result<()> {
        std::fs::create_dir_all(self.parent_dir())?;

        let lock_file: File = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;
        let mut lock = fd_lock::RwLock::new(lock_file);
        let _guard = lock.write()?;

        let mut records = self.load()?;
        records.insert(key, record);
        self.store(records)
    }
}

async fn blocking<T, F>(op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| Error::Store(format!("state file task failed: {}", e)))?
}

impl AttemptStore for FileStore {
    async fn get(&self, key: &AttemptKey) -> Result<Option<AttemptRecord>> {
        let store = self.clone();
        let key = key.clone();
        blocking(move || Ok(store.load()?.remove(&key))).await
    }

    async fn put(&self, key: &AttemptKey, record: AttemptRecord) -> Result<()> {
        let store = self.clone();
        let key = key.clone();
        blocking(move || store.put_locked(key, record)).await
    }
}
