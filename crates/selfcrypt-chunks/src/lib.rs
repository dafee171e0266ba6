//! selfcrypt-chunks: content access, chunk planning, and compression
//!
//! # Overview
//! - `source`: the `ByteSource` trait with file and in-memory variants
//! - `planner`: deterministic chunk sizes from content length + content hash
//! - `compression`: compressibility classifier and whole-content zstd codec

pub mod compression;
pub mod planner;
pub mod source;

// Convenience re-exports for the most common operations
pub use compression::{compress, decompress, CompressibilityClassifier};
pub use planner::{chunk_addition, chunk_spans, ChunkPlanner, ChunkSpan, SMALL_CONTENT_CHUNKS};
pub use source::{ByteSource, FileSource, MemorySource};
