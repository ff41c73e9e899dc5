use std::{collections::HashMap, path::PathBuf, sync::Arc};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::{fs, sync::RwLock};

use crate::errors::ServiceError;

/// Persisted unit: the record table plus the identifier allocation counter.
///
/// Wire format keeps the original field names of the stored file:
/// `{"List": {...}, "Increment": n}`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Snapshot<V> {
    #[serde(rename = "List")]
    pub list: HashMap<String, V>,
    #[serde(rename = "Increment")]
    pub increment: u64,
}

impl<V> Default for Snapshot<V> {
    fn default() -> Self {
        Self { list: HashMap::new(), increment: 0 }
    }
}

/// Generic JSON file-backed snapshot store.
///
/// Persists a `Snapshot<V>` to a single JSON file. The file is the source of
/// truth: every operation re-reads it before acting, and mutations rewrite it
/// in full before returning. There is no caching across calls; the in-memory
/// snapshot behind the lock is only a decode buffer for the current mutation.
///
/// The lock serializes mutations against each other for the whole
/// reload-mutate-persist sequence, and readers hold the shared half so they
/// never observe a half-rewritten file.
pub struct JsonSnapshotStore<V> {
    inner: RwLock<Snapshot<V>>,
    file_path: PathBuf,
}

impl<V> JsonSnapshotStore<V>
where
    V: Serialize + DeserializeOwned + Clone,
{
    /// Initialize the store from a path. Seeds the file with an empty
    /// snapshot (empty table, counter 0) if it does not exist yet.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.ok();
        }

        if fs::metadata(&file_path).await.is_err() {
            let empty = Snapshot::<V>::default();
            let data =
                serde_json::to_vec(&empty).map_err(|e| ServiceError::Decode(e.to_string()))?;
            fs::write(&file_path, data)
                .await
                .map_err(|e| ServiceError::Io(e.to_string()))?;
        }

        Ok(Arc::new(Self { inner: RwLock::new(Snapshot::default()), file_path }))
    }

    async fn load(&self) -> Result<Snapshot<V>, ServiceError> {
        let bytes = fs::read(&self.file_path)
            .await
            .map_err(|e| ServiceError::Io(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| ServiceError::Decode(e.to_string()))
    }

    async fn save(&self, snapshot: &Snapshot<V>) -> Result<(), ServiceError> {
        let data =
            serde_json::to_vec(snapshot).map_err(|e| ServiceError::Decode(e.to_string()))?;
        fs::write(&self.file_path, data)
            .await
            .map_err(|e| ServiceError::Io(e.to_string()))
    }

    /// Read the current snapshot from the file under the shared lock.
    pub async fn read(&self) -> Result<Snapshot<V>, ServiceError> {
        let _guard = self.inner.read().await;
        self.load().await
    }

    /// Apply a mutation under the exclusive lock: reload the file, run `f`
    /// against the decoded snapshot, then persist the whole snapshot.
    ///
    /// If `f` fails the file is left untouched. If the persist fails, the
    /// next operation reloads from the unchanged file, so no partially
    /// written state survives in memory.
    pub async fn update<F, T>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut Snapshot<V>) -> Result<T, ServiceError>,
    {
        let mut snapshot = self.inner.write().await;
        *snapshot = self.load().await?;
        let out = f(&mut snapshot)?;
        self.save(&snapshot).await?;
        Ok(out)
    }
}
