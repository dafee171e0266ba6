//! OpenDAL-backed chunk store
//!
//! Chunks live at `{prefix}/{name}`. Retries are handled here, by OpenDAL's
//! retry layer, so the engine above can stay retry-free.

use anyhow::{Context, Result};
use bytes::Bytes;
use opendal::{ErrorKind, Operator};
use selfcrypt_core::StoreConfig;
use tracing::debug;

use crate::store::{ChunkStore, StoreError};

/// Build an OpenDAL Operator for the configured backend.
///
/// `memory` keeps chunks in process; `fs` writes them under `root`.
pub fn build_operator(cfg: &StoreConfig) -> Result<Operator> {
    let op = match cfg.backend.as_str() {
        "memory" => Operator::new(opendal::services::Memory::default())
            .context("creating OpenDAL memory operator")?
            .finish(),
        "fs" => {
            // opendal 0.55: builders use consuming pattern (methods take `self`, return `Self`)
            let root = cfg.root.to_string_lossy();
            Operator::new(opendal::services::Fs::default().root(&root))
                .with_context(|| format!("creating OpenDAL fs operator at {root}"))?
                .finish()
        }
        other => anyhow::bail!("unsupported store backend: {other}"),
    };

    Ok(op
        .layer(opendal::layers::LoggingLayer::default())
        .layer(
            opendal::layers::RetryLayer::new()
                .with_max_times(cfg.max_retries)
                .with_jitter(),
        ))
}

/// A [`ChunkStore`] over any OpenDAL operator.
#[derive(Debug, Clone)]
pub struct OpendalStore {
    op: Operator,
    prefix: String,
}

impl OpendalStore {
    pub fn new(op: Operator, prefix: impl Into<String>) -> Self {
        Self {
            op,
            prefix: prefix.into().trim_matches('/').to_string(),
        }
    }

    /// Build the operator from config and wrap it.
    pub fn from_config(cfg: &StoreConfig) -> Result<Self> {
        Ok(Self::new(build_operator(cfg)?, cfg.prefix.clone()))
    }

    pub fn operator(&self) -> &Operator {
        &self.op
    }

    fn key(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{name}", self.prefix)
        }
    }
}

fn backend(e: opendal::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait::async_trait]
impl ChunkStore for OpendalStore {
    async fn put(&self, name: &str, data: Bytes) -> Result<(), StoreError> {
        let key = self.key(name);
        debug!(key = %key, size = data.len(), "writing chunk");
        self.op.write(&key, data).await.map(|_| ()).map_err(backend)
    }

    async fn get(&self, name: &str) -> Result<Option<Bytes>, StoreError> {
        match self.op.read(&self.key(name)).await {
            Ok(buf) => Ok(Some(buf.to_bytes())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(backend(e)),
        }
    }

    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        self.op.exists(&self.key(name)).await.map_err(backend)
    }
}
