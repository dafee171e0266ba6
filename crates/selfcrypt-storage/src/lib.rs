//! selfcrypt-storage: content-addressed chunk stores
//!
//! The engine only ever sees `dyn ChunkStore`. Durability, replication and
//! retry policy belong to the implementation behind it.

pub mod memory;
pub mod operator;
pub mod store;

pub use memory::MemoryStore;
pub use operator::{build_operator, OpendalStore};
pub use store::{ChunkStore, StoreError};
