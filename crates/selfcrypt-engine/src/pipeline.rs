//! CPU-bound chunk transforms, run on rayon
//!
//! Encode has a hard barrier between its two phases: every chunk's chunklet
//! digests must exist before any chunk can be obfuscated, because chunk `i`
//! is keyed by chunks `i+1` and `i+2`.
//!
//! Decode is the reverse walk: the last chunk depends only on the file-hash
//! anchors, so chunks are recovered from the end with a two-entry window.

use rayon::prelude::*;
use selfcrypt_chunks::chunk_spans;
use selfcrypt_crypto::{
    deobfuscate, dependencies, hash_chunklets, name_chunk, obfuscate, ChunkletDigests,
    DigestHex, FileAnchors,
};

/// One chunk after obfuscation, named but not yet collision-resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedChunk {
    pub stored: Vec<u8>,
    pub name: DigestHex,
}

/// Split `content` per `sizes` and obfuscate every chunk.
///
/// `sizes` must sum to `content.len()`.
pub fn encode_chunks(
    content: &[u8],
    sizes: &[u64],
    file_hash: &str,
    chunklet_size: usize,
) -> Vec<EncodedChunk> {
    debug_assert_eq!(sizes.iter().sum::<u64>(), content.len() as u64);

    let plain: Vec<&[u8]> = chunk_spans(sizes)
        .iter()
        .map(|span| {
            let start = span.offset as usize;
            &content[start..start + span.length as usize]
        })
        .collect();

    // Phase 1: pre-encryption hashes of every chunk
    let digests: Vec<ChunkletDigests> = plain
        .par_iter()
        .map(|chunk| hash_chunklets(chunk, chunklet_size))
        .collect();

    // Phase 2: obfuscate and name
    let anchors = FileAnchors::new(file_hash);
    let count = plain.len();
    plain
        .par_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let [a, b] = dependencies(i, count);
            let stored = obfuscate(
                chunk,
                chunklet_size,
                anchors.resolve(a, &digests),
                anchors.resolve(b, &digests),
            );
            let name = name_chunk(&stored);
            EncodedChunk { stored, name }
        })
        .collect()
}

/// Recover the concatenated plaintext of `stored` chunks (in manifest order).
pub fn decode_chunks<B: AsRef<[u8]>>(stored: &[B], file_hash: &str, chunklet_size: usize) -> Vec<u8> {
    let anchors = FileAnchors::new(file_hash);

    // window[0] keys as chunk i+1, window[1] as chunk i+2
    let mut window = [anchors.get(0).clone(), anchors.get(1).clone()];
    let mut recovered: Vec<Vec<u8>> = Vec::with_capacity(stored.len());

    for chunk in stored.iter().rev() {
        let plain = deobfuscate(chunk.as_ref(), chunklet_size, &window[0], &window[1]);
        let digests = hash_chunklets(&plain, chunklet_size);
        let [nearer, _] = window;
        window = [digests, nearer];
        recovered.push(plain);
    }

    let total = recovered.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(total);
    for plain in recovered.iter().rev() {
        out.extend_from_slice(plain);
    }
    out
}
