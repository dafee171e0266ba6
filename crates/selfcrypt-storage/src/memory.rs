//! In-memory chunk store.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

use crate::store::{ChunkStore, StoreError};

/// In-memory chunk store backed by a `RwLock<HashMap>`.
///
/// Useful for tests and for callers that persist chunks themselves.
#[derive(Debug, Default)]
pub struct MemoryStore {
    chunks: RwLock<HashMap<String, Bytes>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.chunks.read().map_err(|_| poisoned())?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Names of every stored chunk, sorted.
    pub fn names(&self) -> Result<Vec<String>, StoreError> {
        let map = self.chunks.read().map_err(|_| poisoned())?;
        let mut names: Vec<String> = map.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Replace a chunk's bytes regardless of its name (for corruption tests).
    pub fn overwrite(&self, name: &str, data: Bytes) -> Result<(), StoreError> {
        let mut map = self.chunks.write().map_err(|_| poisoned())?;
        map.insert(name.to_string(), data);
        Ok(())
    }

    /// Drop a chunk, returning its bytes if it was present.
    pub fn remove(&self, name: &str) -> Result<Option<Bytes>, StoreError> {
        let mut map = self.chunks.write().map_err(|_| poisoned())?;
        Ok(map.remove(name))
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("memory store lock poisoned".into())
}

#[async_trait::async_trait]
impl ChunkStore for MemoryStore {
    async fn put(&self, name: &str, data: Bytes) -> Result<(), StoreError> {
        let mut map = self.chunks.write().map_err(|_| poisoned())?;
        debug!(name, size = data.len(), "storing chunk in memory");
        map.insert(name.to_string(), data);
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<Bytes>, StoreError> {
        let map = self.chunks.read().map_err(|_| poisoned())?;
        Ok(map.get(name).cloned())
    }

    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        let map = self.chunks.read().map_err(|_| poisoned())?;
        Ok(map.contains_key(name))
    }
}
