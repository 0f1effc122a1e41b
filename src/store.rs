// src/store.rs
//! Document store capability: keyed upserts committed as all-or-nothing batches.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use crate::error::StoreError;

/// Pending upserts against one collection. Setting the same key twice keeps
/// the last document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    collection: String,
    writes: Vec<(String, Value)>,
}

impl WriteBatch {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            writes: Vec::new(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, document: Value) -> &mut Self {
        self.writes.push((key.into(), document));
        self
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn into_writes(self) -> (String, Vec<(String, Value)>) {
        (self.collection, self.writes)
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn new_batch(&self, collection: &str) -> WriteBatch {
        WriteBatch::new(collection)
    }

    /// Apply every write of `batch` or none of them. Returns the number of writes.
    async fn commit(&self, batch: WriteBatch) -> Result<usize, StoreError>;

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError>;

    /// Look up several keys at once. Missing keys are absent from the map.
    async fn get_many(
        &self,
        collection: &str,
        keys: &[String],
    ) -> Result<HashMap<String, Value>, StoreError> {
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(doc) = self.get(collection, key).await? {
                found.insert(key.clone(), doc);
            }
        }
        Ok(found)
    }
}

fn pick(collections: &Collections, collection: &str, keys: &[String]) -> HashMap<String, Value> {
    let Some(docs) = collections.get(collection) else {
        return HashMap::new();
    };
    keys.iter()
        .filter_map(|k| docs.get(k).map(|doc| (k.clone(), doc.clone())))
        .collect()
}

type Collections = HashMap<String, BTreeMap<String, Value>>;

fn apply(collections: &mut Collections, batch: WriteBatch) -> usize {
    let (collection, writes) = batch.into_writes();
    let n = writes.len();
    let docs = collections.entry(collection).or_default();
    for (key, doc) in writes {
        docs.insert(key, doc);
    }
    n
}

/// Process-local store. Commits happen under one write lock, so readers
/// never observe half a batch.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    pub async fn keys(&self, collection: &str) -> Vec<String> {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn commit(&self, batch: WriteBatch) -> Result<usize, StoreError> {
        let mut guard = self.collections.write().await;
        Ok(apply(&mut guard, batch))
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.get(key).cloned()))
    }

    async fn get_many(
        &self,
        collection: &str,
        keys: &[String],
    ) -> Result<HashMap<String, Value>, StoreError> {
        Ok(pick(&*self.collections.read().await, collection, keys))
    }
}

/// Single JSON snapshot on disk. A commit writes a sibling temp file and
/// renames it over the snapshot, so a failed commit leaves the old file intact.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Collections, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Collections::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Collections::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn persist(&self, collections: &Collections) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let bytes = serde_json::to_vec_pretty(collections)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn commit(&self, batch: WriteBatch) -> Result<usize, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut collections = self.load().await?;
        let n = apply(&mut collections, batch);
        self.persist(&collections).await?;
        tracing::debug!(target: "store", path = %self.path.display(), writes = n, "snapshot committed");
        Ok(n)
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let collections = self.load().await?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(key).cloned()))
    }

    /// One snapshot read for the whole key set.
    async fn get_many(
        &self,
        collection: &str,
        keys: &[String],
    ) -> Result<HashMap<String, Value>, StoreError> {
        let collections = self.load().await?;
        Ok(pick(&collections, collection, keys))
    }
}
