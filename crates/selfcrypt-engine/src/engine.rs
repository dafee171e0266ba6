//! Self-encryption engine: encrypt/decrypt orchestration over a ChunkStore
//!
//! Encrypt:
//!   - classify compressibility, read and hash the content
//!   - compress (optional) and plan chunk sizes from the content hash
//!   - obfuscate + name every chunk (rayon, off the async runtime)
//!   - resolve name collisions, then `exists` → `put` with bounded concurrency
//!
//! Decrypt:
//!   - validate the DataMap, fetch chunks in order with bounded concurrency
//!   - check every chunk against its size and name
//!   - de-obfuscate last-to-first, decompress, check the whole-content hash

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use rayon::prelude::*;
use selfcrypt_chunks::{
    compress, decompress, ByteSource, ChunkPlanner, CompressibilityClassifier, FileSource,
    MemorySource,
};
use selfcrypt_core::{DataMap, SelfCryptConfig, SelfCryptError, SelfCryptResult};
use selfcrypt_crypto::{digest, is_digest_hex, is_resolution_of, resolve_collision};
use selfcrypt_storage::{ChunkStore, OpendalStore, StoreError};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::pipeline::{decode_chunks, encode_chunks};
use crate::state::{EngineState, StateTracker};

/// Progress callback type (done, total, message)
pub type ProgressFn = Box<dyn Fn(u64, u64, &str) + Send + Sync>;

/// Result of encrypting one input
#[derive(Debug, Clone)]
pub struct Encrypted {
    pub data_map: DataMap,
    /// Chunks newly written to the store
    pub chunks_written: usize,
    /// Chunks the store already held (not rewritten)
    pub chunks_deduplicated: usize,
    /// Bytes newly written to the store
    pub bytes_written: u64,
}

/// Options for [`SelfEncryptor::decrypt_to_path`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DecryptOptions {
    /// Skip this many leading bytes of the recovered content
    pub offset: u64,
    /// Replace an existing file at the destination
    pub overwrite: bool,
}

#[derive(Default)]
pub struct SelfEncryptorBuilder {
    config: Option<SelfCryptConfig>,
    store: Option<Arc<dyn ChunkStore>>,
    progress: Option<ProgressFn>,
}

impl SelfEncryptorBuilder {
    pub fn config(mut self, config: SelfCryptConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn store(mut self, store: Arc<dyn ChunkStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn progress<F>(mut self, f: F) -> Self
    where
        F: Fn(u64, u64, &str) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(f));
        self
    }

    pub fn build(self) -> SelfCryptResult<SelfEncryptor> {
        let store = self.store.ok_or(SelfCryptError::NullArgument("store"))?;
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(SelfEncryptor {
            planner: ChunkPlanner::new(config.chunking)?,
            classifier: CompressibilityClassifier::new(config.compression.clone()),
            config,
            store,
            progress: self.progress,
        })
    }
}

/// Convergent, key-less encryption of content into a content-addressed store.
///
/// Identical content always produces identical chunks and an identical
/// DataMap, so repeated encryptions deduplicate against the store.
///
/// # Memory
/// Both directions are whole-buffer: `encrypt` reads the entire source into
/// memory (`ByteSource::read_all`), and `decrypt` holds the stored chunks, the
/// recovered payload and the decompressed output at the same time. Peak usage
/// is therefore roughly three times the content size.
pub struct SelfEncryptor {
    config: SelfCryptConfig,
    store: Arc<dyn ChunkStore>,
    planner: ChunkPlanner,
    classifier: CompressibilityClassifier,
    progress: Option<ProgressFn>,
}

impl SelfEncryptor {
    pub fn builder() -> SelfEncryptorBuilder {
        SelfEncryptorBuilder::default()
    }

    /// Build an engine whose store comes from `config.store`.
    pub fn from_config(config: SelfCryptConfig) -> SelfCryptResult<Self> {
        let store = OpendalStore::from_config(&config.store)
            .map_err(|e| SelfCryptError::Config(format!("opening store: {e:#}")))?;
        Self::builder().config(config).store(Arc::new(store)).build()
    }

    pub fn config(&self) -> &SelfCryptConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ChunkStore> {
        &self.store
    }

    /// Encrypt an in-memory buffer.
    pub async fn encrypt_bytes(&self, data: impl Into<Bytes>) -> SelfCryptResult<Encrypted> {
        self.encrypt(MemorySource::new(data), None).await
    }

    /// Encrypt a file on disk.
    pub async fn encrypt_file(&self, path: &Path) -> SelfCryptResult<Encrypted> {
        self.encrypt(FileSource::open(path)?, None).await
    }

    /// Encrypt `source` into the store and return its DataMap.
    ///
    /// `file_hash` may carry a precomputed SHA-512 of the content. It must be
    /// well-formed and match the content, or the call fails with
    /// `InvalidManifest` before any chunk is written.
    pub async fn encrypt<S>(
        &self,
        source: S,
        file_hash: Option<String>,
    ) -> SelfCryptResult<Encrypted>
    where
        S: ByteSource + 'static,
    {
        let mut tracker = StateTracker::new("encrypt");
        match self.encrypt_tracked(&mut tracker, source, file_hash).await {
            Ok(out) => {
                tracker.advance(EngineState::Done);
                info!(
                    file_hash = %out.data_map.file_hash,
                    chunks = out.data_map.chunk_count(),
                    written = out.chunks_written,
                    deduplicated = out.chunks_deduplicated,
                    compressed = out.data_map.compressed,
                    "encrypted"
                );
                Ok(out)
            }
            Err(e) => {
                tracker.fail(&e);
                Err(e)
            }
        }
    }

    async fn encrypt_tracked<S>(
        &self,
        tracker: &mut StateTracker,
        source: S,
        file_hash: Option<String>,
    ) -> SelfCryptResult<Encrypted>
    where
        S: ByteSource + 'static,
    {
        if let Some(hash) = &file_hash {
            if !is_digest_hex(hash) {
                return Err(SelfCryptError::InvalidManifest(format!(
                    "pre-seeded file_hash is not a SHA-512 hex digest: {hash:?}"
                )));
            }
        }

        // Classify, read, hash
        tracker.advance(EngineState::Classifying);
        let classifier = self.classifier.clone();
        let (content, compressed, file_hash) = blocking(move || {
            if source.is_empty()? {
                return Err(SelfCryptError::EmptyInput);
            }
            let compressed = classifier.should_compress(&source)?;
            let content = source.read_all()?;
            let actual = digest(&content);
            if let Some(seeded) = file_hash {
                if seeded != actual {
                    return Err(SelfCryptError::InvalidManifest(format!(
                        "pre-seeded file_hash does not match content hash {actual}"
                    )));
                }
            }
            Ok((content, compressed, actual))
        })
        .await?;
        debug!(bytes = content.len(), compressed, "content classified");

        // Compress, plan, obfuscate
        tracker.advance(EngineState::Planning);
        let planner = self.planner;
        let level = self.classifier.level();
        let chunklet_size = self.config.chunking.chunklet_size;
        let hash = file_hash.clone();
        let (sizes, encoded) = blocking(move || {
            let payload = if compressed {
                compress(&content, level)?
            } else {
                content
            };
            let sizes = planner.plan(payload.len() as u64, &hash);
            let encoded = encode_chunks(&payload, &sizes, &hash, chunklet_size);
            Ok((sizes, encoded))
        })
        .await?;
        debug!(chunks = sizes.len(), "chunks planned and encoded");

        // Names must be unique within one DataMap
        let mut taken: HashSet<String> = HashSet::with_capacity(encoded.len());
        let mut named = Vec::with_capacity(encoded.len());
        for chunk in encoded {
            let name = resolve_collision(&chunk.name, |n| taken.contains(n));
            taken.insert(name.clone());
            named.push((name, Bytes::from(chunk.stored)));
        }

        let chunk_names: Vec<String> = named.iter().map(|(name, _)| name.clone()).collect();
        let total = named.len() as u64;
        let mut writes = stream::iter(named.into_iter().enumerate())
            .map(|(index, (name, data))| {
                let store = Arc::clone(&self.store);
                async move { store_chunk(store.as_ref(), index, &name, data).await }
            })
            .buffer_unordered(self.config.store.write_concurrency.max(1));

        let mut chunks_written = 0usize;
        let mut chunks_deduplicated = 0usize;
        let mut bytes_written = 0u64;
        let mut done = 0u64;
        while let Some(res) = writes.next().await {
            let (index, written) = res?;
            match written {
                Some(len) => {
                    chunks_written += 1;
                    bytes_written += len;
                }
                None => chunks_deduplicated += 1,
            }
            done += 1;
            tracker.advance(EngineState::Processing(index));
            if let Some(cb) = &self.progress {
                cb(done, total, &format!("chunk {done}/{total}"));
            }
        }
        drop(writes);

        tracker.advance(EngineState::Finalizing);
        let data_map = DataMap {
            file_hash,
            compressed,
            chunk_sizes: sizes,
            chunk_names,
        };
        data_map.validate()?;

        Ok(Encrypted {
            data_map,
            chunks_written,
            chunks_deduplicated,
            bytes_written,
        })
    }

    /// Recover the content described by `data_map`.
    pub async fn decrypt(&self, data_map: &DataMap) -> SelfCryptResult<Vec<u8>> {
        validate_for_decrypt(data_map)?;

        let stored = self.fetch_chunks(data_map).await?;
        let dm = data_map.clone();
        let chunklet_size = self.config.chunking.chunklet_size;
        let content = blocking(move || {
            check_names(&dm, &stored)?;
            let payload = decode_chunks(&stored, &dm.file_hash, chunklet_size);
            let content = if dm.compressed {
                decompress(&payload).map_err(|e| {
                    SelfCryptError::Integrity(format!("decompressing content: {e:#}"))
                })?
            } else {
                payload
            };
            if digest(&content) != dm.file_hash {
                return Err(SelfCryptError::Integrity(
                    "recovered content does not match file_hash".into(),
                ));
            }
            Ok(content)
        })
        .await?;

        info!(
            file_hash = %data_map.file_hash,
            chunks = data_map.chunk_count(),
            bytes = content.len(),
            "decrypted"
        );
        Ok(content)
    }

    /// Decrypt into `writer`. Returns the number of bytes written.
    pub async fn decrypt_to_writer<W>(
        &self,
        data_map: &DataMap,
        writer: &mut W,
    ) -> SelfCryptResult<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let content = self.decrypt(data_map).await?;
        writer.write_all(&content).await?;
        writer.flush().await?;
        Ok(content.len() as u64)
    }

    /// Decrypt to `path`, writing the content from `options.offset` on.
    ///
    /// The file is written to a sibling temp path and renamed into place, so
    /// a failed decrypt never leaves partial output at `path`.
    pub async fn decrypt_to_path(
        &self,
        data_map: &DataMap,
        path: &Path,
        options: DecryptOptions,
    ) -> SelfCryptResult<u64> {
        if !options.overwrite && tokio::fs::try_exists(path).await? {
            return Err(SelfCryptError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} exists and overwrite is off", path.display()),
            )));
        }

        let content = self.decrypt(data_map).await?;
        let offset = usize::try_from(options.offset)
            .ok()
            .filter(|&o| o <= content.len())
            .ok_or_else(|| {
                SelfCryptError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!(
                        "offset {} is past the end of {} bytes",
                        options.offset,
                        content.len()
                    ),
                ))
            })?;
        let body = &content[offset..];

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("selfcrypt_tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, path).await?;

        debug!(path = %path.display(), offset, bytes = body.len(), "decrypted to path");
        Ok(body.len() as u64)
    }

    /// Check that every chunk of `data_map` is present and intact.
    ///
    /// Cheaper than [`decrypt`](Self::decrypt): nothing is de-obfuscated.
    pub async fn verify(&self, data_map: &DataMap) -> SelfCryptResult<()> {
        validate_for_decrypt(data_map)?;
        let stored = self.fetch_chunks(data_map).await?;
        let dm = data_map.clone();
        blocking(move || check_names(&dm, &stored)).await?;
        debug!(file_hash = %data_map.file_hash, chunks = data_map.chunk_count(), "verified");
        Ok(())
    }

    /// Fetch every chunk in manifest order, checking presence and size.
    async fn fetch_chunks(&self, data_map: &DataMap) -> SelfCryptResult<Vec<Bytes>> {
        let total = data_map.chunk_count() as u64;
        let wanted = data_map.chunk_names.iter().zip(&data_map.chunk_sizes);
        let mut fetches = stream::iter(wanted.enumerate())
            .map(|(index, (name, &size))| {
                let store = Arc::clone(&self.store);
                async move { fetch_chunk(store.as_ref(), index, name, size).await }
            })
            .buffered(self.config.store.write_concurrency.max(1));

        let mut chunks = Vec::with_capacity(data_map.chunk_count());
        while let Some(res) = fetches.next().await {
            chunks.push(res?);
            if let Some(cb) = &self.progress {
                let done = chunks.len() as u64;
                cb(done, total, &format!("fetched chunk {done}/{total}"));
            }
        }
        Ok(chunks)
    }
}

/// Store one chunk unless the store already holds it.
///
/// Returns the chunk index and `Some(len)` if bytes were written.
async fn store_chunk(
    store: &dyn ChunkStore,
    index: usize,
    name: &str,
    data: Bytes,
) -> SelfCryptResult<(usize, Option<u64>)> {
    let write_err = |e: StoreError| SelfCryptError::StoreWrite {
        name: name.to_string(),
        reason: e.to_string(),
    };

    if store.exists(name).await.map_err(write_err)? {
        debug!(index, name, "chunk already stored");
        return Ok((index, None));
    }
    let len = data.len() as u64;
    store.put(name, data).await.map_err(write_err)?;
    Ok((index, Some(len)))
}

async fn fetch_chunk(
    store: &dyn ChunkStore,
    index: usize,
    name: &str,
    size: u64,
) -> SelfCryptResult<Bytes> {
    let data = match store.get(name).await {
        Ok(Some(data)) => data,
        Ok(None) | Err(StoreError::NotFound(_)) => {
            return Err(SelfCryptError::ChunkNotFound {
                index,
                name: name.to_string(),
            })
        }
        Err(e) => return Err(SelfCryptError::Storage(e.to_string())),
    };

    if data.len() as u64 != size {
        return Err(SelfCryptError::Integrity(format!(
            "chunk {index} is {} bytes, expected {size}",
            data.len()
        )));
    }
    Ok(data)
}

fn validate_for_decrypt(data_map: &DataMap) -> SelfCryptResult<()> {
    data_map.validate()?;
    if !is_digest_hex(&data_map.file_hash) {
        return Err(SelfCryptError::InvalidManifest(
            "file_hash is not a SHA-512 hex digest".into(),
        ));
    }
    Ok(())
}

/// Every stored chunk must hash to its name (or a collision-renamed form).
fn check_names(data_map: &DataMap, stored: &[Bytes]) -> SelfCryptResult<()> {
    let bad = data_map
        .chunk_names
        .par_iter()
        .zip(stored.par_iter())
        .enumerate()
        .find_first(|(_, (name, data))| !is_resolution_of(name, &digest(data)));

    match bad {
        Some((index, (name, _))) => Err(SelfCryptError::Integrity(format!(
            "chunk {index} does not match its name {name}"
        ))),
        None => Ok(()),
    }
}

/// Run CPU or blocking-I/O work off the async runtime.
async fn blocking<T, F>(f: F) -> SelfCryptResult<T>
where
    F: FnOnce() -> SelfCryptResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| SelfCryptError::Other(anyhow::anyhow!("blocking task failed: {e}")))?
}
