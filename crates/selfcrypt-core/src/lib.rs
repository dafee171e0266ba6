pub mod config;
pub mod error;
pub mod types;

pub use config::{ChunkingConfig, CompressionConfig, SelfCryptConfig, StoreConfig};
pub use error::{SelfCryptError, SelfCryptResult};
pub use types::DataMap;
