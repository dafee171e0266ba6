//! Neighbour-keyed XOR obfuscation
//!
//! Dependency contract (encode and decode must agree on it exactly):
//!
//! ```text
//! chunk i  depends on  chunk i+1 and chunk i+2
//! index >= count       is replaced by a file-hash anchor (0 or 1)
//!
//! count = 4:   0 <- (1, 2)   1 <- (2, 3)   2 <- (3, A0)   3 <- (A0, A1)
//! ```
//!
//! The graph is acyclic, so decode walks from the last chunk to the first
//! carrying a two-entry window of already recovered digests.

use crate::chunklet::{chunklet_spans, ChunkletDigests};
use crate::digest::{digest, resize_digest};

/// Where one half of a chunk's key material comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    /// Plaintext digests of another chunk
    Chunk(usize),
    /// Digest derived from the whole-content hash
    Anchor(usize),
}

/// The two dependencies of chunk `index` in a `count`-chunk manifest.
pub fn dependencies(index: usize, count: usize) -> [Dependency; 2] {
    [1, 2].map(|step| {
        let j = index + step;
        if j < count {
            Dependency::Chunk(j)
        } else {
            Dependency::Anchor(j - count)
        }
    })
}

/// Key material standing in for the chunks past the end.
#[derive(Debug, Clone)]
pub struct FileAnchors {
    anchors: [ChunkletDigests; 2],
}

impl FileAnchors {
    pub fn new(file_hash: &str) -> Self {
        Self {
            anchors: [
                ChunkletDigests::single(file_hash.to_string()),
                ChunkletDigests::single(digest(file_hash.as_bytes())),
            ],
        }
    }

    pub fn get(&self, k: usize) -> &ChunkletDigests {
        &self.anchors[k]
    }

    /// Look up a dependency against the digests of every chunk.
    pub fn resolve<'a>(
        &'a self,
        dep: Dependency,
        chunks: &'a [ChunkletDigests],
    ) -> &'a ChunkletDigests {
        match dep {
            Dependency::Chunk(j) => &chunks[j],
            Dependency::Anchor(k) => self.get(k),
        }
    }
}

/// Alternate the characters of two digests: `a0 b0 a1 b1 ...`.
///
/// Every prefix of two or more characters draws on both neighbours.
pub fn interleave(a: &str, b: &str) -> String {
    a.chars().zip(b.chars()).flat_map(|(x, y)| [x, y]).collect()
}

/// Keystream for a `len`-byte chunk keyed by its two dependencies.
///
/// Chunklet `j` of the chunk is covered by `interleave(a[j], b[j])` resized
/// to the chunklet's length.
pub fn keystream(
    len: usize,
    chunklet_size: usize,
    a: &ChunkletDigests,
    b: &ChunkletDigests,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    for (j, span) in chunklet_spans(len, chunklet_size).enumerate() {
        let seed = interleave(a.get(j), b.get(j));
        out.extend_from_slice(resize_digest(&seed, span).as_bytes());
    }
    out
}

/// XOR `chunk` with the keystream derived from `a` and `b`.
pub fn obfuscate(
    chunk: &[u8],
    chunklet_size: usize,
    a: &ChunkletDigests,
    b: &ChunkletDigests,
) -> Vec<u8> {
    let ks = keystream(chunk.len(), chunklet_size, a, b);
    chunk.iter().zip(ks).map(|(byte, key)| byte ^ key).collect()
}

/// Inverse of [`obfuscate`]; XOR is its own inverse.
pub fn deobfuscate(
    stored: &[u8],
    chunklet_size: usize,
    a: &ChunkletDigests,
    b: &ChunkletDigests,
) -> Vec<u8> {
    obfuscate(stored, chunklet_size, a, b)
}
