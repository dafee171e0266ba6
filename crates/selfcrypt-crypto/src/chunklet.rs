//! Pre-encryption hashing over fixed-size chunklets
//!
//! A chunk is cut into `chunklet_size` slices; each slice is hashed on its own
//! (not cumulatively). When the length is not a multiple of the chunklet size
//! the final chunklet absorbs the remainder, so it may be up to
//! `2 * chunklet_size - 1` bytes. A chunk shorter than one chunklet is a single
//! chunklet.
//!
//! The pre-encryption hash covers only the first `chunklet_size` bytes, so it
//! is unaffected by how the remainder is folded into the final chunklet.

use crate::digest::{digest, DigestHex};

/// Per-chunklet digests of one plaintext chunk, in chunk order.
///
/// Never empty: an empty chunk carries the digest of the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkletDigests {
    leading: DigestHex,
    digests: Vec<DigestHex>,
}

impl ChunkletDigests {
    /// Wrap a single digest, e.g. a file-hash anchor.
    pub fn single(digest: DigestHex) -> Self {
        Self {
            leading: digest.clone(),
            digests: vec![digest],
        }
    }

    /// The chunk's pre-encryption hash: digest of its first `chunklet_size`
    /// bytes (the whole chunk when shorter).
    pub fn leading(&self) -> &str {
        &self.leading
    }

    /// Digest for chunklet `j`, wrapping when `j` runs past the end.
    pub fn get(&self, j: usize) -> &str {
        &self.digests[j % self.digests.len()]
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    pub fn as_slice(&self) -> &[DigestHex] {
        &self.digests
    }
}

/// Hash each `chunklet_size` slice of `chunk`.
///
/// # Panics
/// If `chunklet_size` is 0.
pub fn hash_chunklets(chunk: &[u8], chunklet_size: usize) -> ChunkletDigests {
    assert!(chunklet_size > 0, "chunklet size must be non-zero");

    if chunk.is_empty() {
        return ChunkletDigests::single(digest(&[]));
    }

    let mut offset = 0;
    let digests = chunklet_spans(chunk.len(), chunklet_size)
        .map(|span| {
            let d = digest(&chunk[offset..offset + span]);
            offset += span;
            d
        })
        .collect();
    ChunkletDigests {
        leading: digest(&chunk[..chunklet_size.min(chunk.len())]),
        digests,
    }
}

/// Byte length of every chunklet of a `len`-byte chunk.
///
/// `len / chunklet_size` chunklets (at least one for a non-empty chunk), the
/// last widened by `len % chunklet_size`.
pub(crate) fn chunklet_spans(len: usize, chunklet_size: usize) -> impl Iterator<Item = usize> {
    let count = (len / chunklet_size).max(usize::from(len > 0));
    let leading = count.saturating_sub(1);
    std::iter::repeat(chunklet_size)
        .take(leading)
        .chain((count > 0).then(|| len - leading * chunklet_size))
}
