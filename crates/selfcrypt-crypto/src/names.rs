//! Content names for stored chunks and collision resolution
//!
//! A chunk's name is the SHA-512 of its obfuscated bytes. Two chunks of one
//! manifest can legitimately produce the same bytes (e.g. two empty chunks),
//! so later occurrences are renamed:
//!
//! ```text
//! attempt k  =  hex(k) ++ candidate[.. len - len(hex(k))]
//! ```
//!
//! Length is preserved. All attempts with the same marker width differ in
//! their marker, so for any finite set of taken names a free one is found.

use tracing::warn;

use crate::digest::{digest, DigestHex};

/// Name a chunk by the digest of its stored (obfuscated) bytes.
pub fn name_chunk(obfuscated: &[u8]) -> DigestHex {
    digest(obfuscated)
}

/// Return `candidate`, or the first renamed variant not in `taken`.
pub fn resolve_collision<F>(candidate: &str, mut taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    if !taken(candidate) {
        return candidate.to_string();
    }

    for k in 1u64.. {
        let marker = format!("{k:x}");
        if marker.len() >= candidate.len() {
            break;
        }
        let renamed = format!("{marker}{}", &candidate[..candidate.len() - marker.len()]);
        if !taken(&renamed) {
            warn!(original = %candidate, resolved = %renamed, attempts = k, "chunk name collision");
            return renamed;
        }
    }

    unreachable!("collision space of a {}-char name exhausted", candidate.len())
}

/// True if `name` is `digest` itself or one of its renamed variants.
pub fn is_resolution_of(name: &str, digest: &str) -> bool {
    if name == digest {
        return true;
    }
    if name.len() != digest.len() || !name.is_ascii() || !digest.is_ascii() {
        return false;
    }

    (1..name.len()).any(|width| {
        let (marker, rest) = name.split_at(width);
        let valid_marker = !marker.starts_with('0')
            && marker.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        valid_marker && rest == &digest[..digest.len() - width]
    })
}
