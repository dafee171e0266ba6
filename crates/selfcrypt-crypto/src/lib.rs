//! selfcrypt-crypto: key-less convergent self-encryption primitives
//!
//! Pipeline per chunk:
//!
//! ```text
//! plaintext chunk ──► chunklet SHA-512s ──┐
//!                                         │ (of chunks i+1, i+2, or file-hash anchors)
//! plaintext chunk i ──► XOR keystream ◄───┘ ──► SHA-512 name ──► collision resolution
//! ```
//!
//! Nothing here needs a secret key: the key material for chunk `i` is the
//! plaintext digest of its two successors, and the last two chunks fall back
//! to anchors derived from the whole-content hash held in the DataMap.

pub mod chunklet;
pub mod digest;
pub mod names;
pub mod obfuscate;

pub use chunklet::{hash_chunklets, ChunkletDigests};
pub use digest::{
    digest, digest_file, digest_reader, is_digest_hex, resize_digest, DigestHex,
};
pub use names::{is_resolution_of, name_chunk, resolve_collision};
pub use obfuscate::{
    deobfuscate, dependencies, interleave, keystream, obfuscate, Dependency, FileAnchors,
};

/// Length of a hex-encoded SHA-512 digest
pub const DIGEST_HEX_LEN: usize = 128;
