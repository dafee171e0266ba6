use thiserror::Error;

pub type SelfCryptResult<T> = Result<T, SelfCryptError>;

#[derive(Debug, Error)]
pub enum SelfCryptError {
    #[error("input is empty: nothing to encrypt")]
    EmptyInput,

    #[error("invalid data map: {0}")]
    InvalidManifest(String),

    #[error("chunk {index} not found in store: {name}")]
    ChunkNotFound { index: usize, name: String },

    #[error("failed to store chunk {name}: {reason}")]
    StoreWrite { name: String, reason: String },

    #[error("integrity check failed: {0}")]
    Integrity(String),

    #[error("required argument missing: {0}")]
    NullArgument(&'static str),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SelfCryptError {
    /// Short stable label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyInput => "empty_input",
            Self::InvalidManifest(_) => "invalid_manifest",
            Self::ChunkNotFound { .. } => "chunk_not_found",
            Self::StoreWrite { .. } => "store_write",
            Self::Integrity(_) => "integrity",
            Self::NullArgument(_) => "null_argument",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Other(_) => "other",
        }
    }
}
