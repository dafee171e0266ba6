use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{SelfCryptError, SelfCryptResult};

/// Manifest describing how to reassemble content from its stored chunks.
///
/// Produced by encryption, consumed by decryption. Field order and names are
/// the persisted form and must not change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataMap {
    /// SHA-512 hex of the original (pre-compression) content
    pub file_hash: String,
    /// Whether the content was zstd-compressed before chunking
    pub compressed: bool,
    /// Chunk lengths in content order; sums to the (possibly compressed) length
    pub chunk_sizes: Vec<u64>,
    /// Content-address of each stored chunk, same order as `chunk_sizes`
    pub chunk_names: Vec<String>,
}

impl DataMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A manifest with only the file hash seeded.
    pub fn with_file_hash(file_hash: impl Into<String>) -> Self {
        Self {
            file_hash: file_hash.into(),
            ..Self::default()
        }
    }

    pub fn push_chunk(&mut self, size: u64, name: String) {
        self.chunk_sizes.push(size);
        self.chunk_names.push(name);
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_names.len()
    }

    /// Sum of chunk sizes, `None` on overflow.
    pub fn total_size(&self) -> Option<u64> {
        self.chunk_sizes
            .iter()
            .try_fold(0u64, |acc, &size| acc.checked_add(size))
    }

    /// Structural checks required before a manifest can drive decryption.
    pub fn validate(&self) -> SelfCryptResult<()> {
        if self.file_hash.is_empty() {
            return Err(SelfCryptError::InvalidManifest("file_hash is empty".into()));
        }
        if self.chunk_sizes.len() != self.chunk_names.len() {
            return Err(SelfCryptError::InvalidManifest(format!(
                "{} chunk sizes but {} chunk names",
                self.chunk_sizes.len(),
                self.chunk_names.len()
            )));
        }
        if self.chunk_names.is_empty() {
            return Err(SelfCryptError::InvalidManifest("no chunks".into()));
        }
        match self.total_size() {
            None => {
                return Err(SelfCryptError::InvalidManifest(
                    "chunk sizes overflow u64".into(),
                ))
            }
            Some(0) => {
                return Err(SelfCryptError::InvalidManifest(
                    "chunk sizes sum to zero".into(),
                ))
            }
            Some(_) => {}
        }

        let mut seen = HashSet::with_capacity(self.chunk_names.len());
        for (index, name) in self.chunk_names.iter().enumerate() {
            if name.is_empty() {
                return Err(SelfCryptError::InvalidManifest(format!(
                    "chunk {index} has an empty name"
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(SelfCryptError::InvalidManifest(format!(
                    "chunk {index} repeats name {name}"
                )));
            }
        }
        Ok(())
    }

    /// Serialize to JSON bytes
    pub fn to_bytes(&self) -> SelfCryptResult<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| SelfCryptError::InvalidManifest(format!("serialization: {e}")))
    }

    /// Deserialize from JSON bytes
    pub fn from_bytes(data: &[u8]) -> SelfCryptResult<Self> {
        serde_json::from_slice(data)
            .map_err(|e| SelfCryptError::InvalidManifest(format!("deserialization: {e}")))
    }
}
