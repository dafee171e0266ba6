//! Hash-seeded chunk planning
//!
//! Boundaries depend only on content length and the whole-content hash, so
//! identical content always plans identical chunks (required for convergent
//! dedup).
//!
//! Policy:
//!   - below the small-content limit: exactly 3 chunks, `n/3, n/3, rest`
//!   - otherwise `count = clamp(n / default_chunk_size, min_chunks, max_chunks)`
//!     and every chunk but the last is `n / count` nudged by -8..=+7 according
//!     to the file hash's hex digit at that position
//!   - the last chunk takes whatever is left, never less than one byte

use selfcrypt_core::{ChunkingConfig, SelfCryptResult};

/// Chunk count for content below the small-content limit
pub const SMALL_CONTENT_CHUNKS: usize = 3;

/// Width of the per-chunk adjustment range (-8..=+7)
const ADJUSTMENT_SPAN: u64 = 16;

/// Signed size adjustment for one file-hash character.
///
/// `'0'` → -8 … `'8'` → 0 … `'f'`/`'F'` → +7; non-hex characters → 0.
pub fn chunk_addition(c: u8) -> i64 {
    match (c as char).to_digit(16) {
        Some(v) => v as i64 - 8,
        None => 0,
    }
}

/// A planned chunk's place in the content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    pub index: usize,
    pub offset: u64,
    pub length: u64,
}

/// `(offset, length)` of each chunk in a plan, in order.
pub fn chunk_spans(sizes: &[u64]) -> Vec<ChunkSpan> {
    let mut offset = 0u64;
    sizes
        .iter()
        .enumerate()
        .map(|(index, &length)| {
            let span = ChunkSpan {
                index,
                offset,
                length,
            };
            offset += length;
            span
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkPlanner {
    config: ChunkingConfig,
}

impl ChunkPlanner {
    /// Fails with `Config` when `config` would make planning impossible
    /// (zero chunk size, `max_chunks < min_chunks`, ...).
    pub fn new(config: ChunkingConfig) -> SelfCryptResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Content shorter than this gets the fixed 3-chunk partition.
    pub fn small_content_limit(&self) -> u64 {
        self.config.min_chunks.max(SMALL_CONTENT_CHUNKS as u64) * ADJUSTMENT_SPAN
    }

    /// Chunk lengths for `total` bytes of content hashed to `file_hash`.
    ///
    /// The lengths always sum to `total`. Empty content plans no chunks.
    pub fn plan(&self, total: u64, file_hash: &str) -> Vec<u64> {
        if total == 0 {
            return Vec::new();
        }
        if total < self.small_content_limit() {
            return small_partition(total);
        }

        let count = (total / self.config.default_chunk_size)
            .clamp(self.config.min_chunks, self.config.max_chunks);
        let base = total / count;
        let hash = file_hash.as_bytes();

        let mut sizes = Vec::with_capacity(count as usize);
        let mut remaining = total;
        for i in 0..count - 1 {
            let adjust = if hash.is_empty() {
                0
            } else {
                chunk_addition(hash[i as usize % hash.len()])
            };
            let wanted = (base as i128 + adjust as i128).max(1) as u64;
            // keep one byte for every chunk still to come
            let reserve = count - 1 - i;
            let size = wanted.min(remaining - reserve);
            sizes.push(size);
            remaining -= size;
        }
        sizes.push(remaining);
        sizes
    }
}

fn small_partition(total: u64) -> Vec<u64> {
    let third = total / SMALL_CONTENT_CHUNKS as u64;
    vec![third, third, total - 2 * third]
}
