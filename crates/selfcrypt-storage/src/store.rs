//! The chunk store contract and its errors.

use bytes::Bytes;

/// Errors surfaced by a chunk store. The engine never retries on them.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested chunk was not found.
    #[error("chunk not found: {0}")]
    NotFound(String),

    /// The backend rejected or failed the operation.
    #[error("backend error: {0}")]
    Backend(String),

    /// An I/O error occurred.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Content-addressed chunk storage.
///
/// Names are chunk digests. `put` is idempotent: storing the same name twice
/// with identical bytes is a no-op. All implementations must be `Send + Sync`
/// for use across async tasks.
#[async_trait::async_trait]
pub trait ChunkStore: Send + Sync {
    /// Store `data` under `name`.
    async fn put(&self, name: &str, data: Bytes) -> Result<(), StoreError>;

    /// Fetch a chunk. Returns `None` if absent.
    async fn get(&self, name: &str) -> Result<Option<Bytes>, StoreError>;

    /// Check whether a chunk exists.
    async fn exists(&self, name: &str) -> Result<bool, StoreError>;
}
