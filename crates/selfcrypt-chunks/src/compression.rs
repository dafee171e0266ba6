//! Compress-or-not decision and the whole-content zstd codec
//!
//! Compression happens once, over the entire content, before planning. The
//! classifier avoids spending cycles on content that is already dense: it
//! trusts a deny-list of archive/media extensions first, then measures how
//! well a bounded prefix sample compresses.

use anyhow::{Context, Result};
use selfcrypt_core::CompressionConfig;
use std::io;
use tracing::debug;

use crate::source::ByteSource;

/// Compress `data` as a single zstd frame.
pub fn compress(data: &[u8], level: i32) -> Result<Vec<u8>> {
    zstd::encode_all(data, level).context("zstd compress")
}

/// Decompress a frame produced by [`compress`].
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    zstd::decode_all(data).context("zstd decompress")
}

#[derive(Debug, Clone)]
pub struct CompressibilityClassifier {
    config: CompressionConfig,
}

impl CompressibilityClassifier {
    pub fn new(config: CompressionConfig) -> Self {
        Self { config }
    }

    pub fn level(&self) -> i32 {
        self.config.level
    }

    /// True if `extension` names content that is already compressed.
    pub fn is_denied_extension(&self, extension: &str) -> bool {
        self.config
            .skip_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }

    /// compressed / original for one sample. Empty samples never compress.
    pub fn sample_ratio(&self, sample: &[u8]) -> io::Result<f64> {
        if sample.is_empty() {
            return Ok(f64::INFINITY);
        }
        let compressed = zstd::encode_all(sample, self.config.level)?;
        Ok(compressed.len() as f64 / sample.len() as f64)
    }

    /// Decide whether `source` should be compressed before chunking.
    pub fn should_compress(&self, source: &dyn ByteSource) -> io::Result<bool> {
        if !self.config.enabled {
            return Ok(false);
        }

        if let Some(ext) = source.extension() {
            if self.is_denied_extension(&ext) {
                debug!(extension = %ext, "compression skipped: extension on deny-list");
                return Ok(false);
            }
        }

        let len = source.len()?;
        let sample_len = len.min(self.config.sample_size as u64) as usize;
        let sample = source.read_range(0, sample_len)?;
        let ratio = self.sample_ratio(&sample)?;
        let compress = ratio < self.config.max_ratio;

        debug!(
            sample_len,
            ratio,
            threshold = self.config.max_ratio,
            compress,
            "compressibility sampled"
        );
        Ok(compress)
    }
}
