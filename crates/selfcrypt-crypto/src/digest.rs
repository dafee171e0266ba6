//! SHA-512 content digests as lowercase hex
//!
//! Every identity in the system is one of these strings: the whole-content
//! file hash, chunklet hashes, and chunk names.

use anyhow::{Context, Result};
use sha2::{Digest as _, Sha512};
use std::io::Read;
use std::path::Path;

use crate::DIGEST_HEX_LEN;

/// A SHA-512 digest, 128 lowercase hex chars
pub type DigestHex = String;

/// Hash a byte slice in memory.
pub fn digest(data: &[u8]) -> DigestHex {
    format!("{:x}", Sha512::digest(data))
}

/// Hash everything a reader yields, 64KB at a time.
pub fn digest_reader<R: Read>(mut reader: R) -> Result<DigestHex> {
    let mut hasher = Sha512::new();
    let mut buf = vec![0u8; 64 * 1024];

    loop {
        let n = reader.read(&mut buf).context("reading for digest")?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Hash a file from disk without loading it whole.
pub fn digest_file(path: &Path) -> Result<DigestHex> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening file for digest: {}", path.display()))?;
    digest_reader(std::io::BufReader::new(file))
}

/// Stretch or cut a digest to exactly `target_len` characters.
///
/// Shorter targets keep the prefix; longer targets repeat the digest
/// cyclically and cut the final copy short.
///
/// # Panics
/// If `target_len` is 0 or `digest` is empty.
pub fn resize_digest(digest: &str, target_len: usize) -> String {
    assert!(target_len > 0, "resize_digest: target length must be non-zero");
    assert!(!digest.is_empty(), "resize_digest: digest must be non-empty");
    digest.chars().cycle().take(target_len).collect()
}

/// True if `s` has the shape of a [`digest`] output.
pub fn is_digest_hex(s: &str) -> bool {
    s.len() == DIGEST_HEX_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
