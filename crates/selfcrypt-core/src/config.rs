use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{SelfCryptError, SelfCryptResult};

/// Top-level engine configuration (loaded from selfcrypt.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfCryptConfig {
    pub chunking: ChunkingConfig,
    pub compression: CompressionConfig,
    pub store: StoreConfig,
}

/// Chunk planning and pre-encryption hashing thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in bytes (default: 256 KiB)
    pub default_chunk_size: u64,
    /// Fewest chunks a non-trivial input is split into
    pub min_chunks: u64,
    /// Most chunks any input is split into
    pub max_chunks: u64,
    /// Sub-chunk granularity for pre-encryption hashing
    pub chunklet_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            default_chunk_size: 256 * 1024,
            min_chunks: 3,
            max_chunks: 40,
            chunklet_size: 16 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Allow compression at all (default: true)
    pub enabled: bool,
    /// zstd level used for the whole-content frame
    pub level: i32,
    /// Bytes of content prefix sampled by the classifier
    pub sample_size: usize,
    /// Compress when compressed_sample / sample is below this ratio
    pub max_ratio: f64,
    /// File extensions whose content is already compressed
    pub skip_extensions: Vec<String>,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: 3,
            sample_size: 256 * 1024,
            max_ratio: 0.9,
            skip_extensions: [
                "7z", "zip", "gz", "tgz", "bz2", "xz", "rar", "zst", "lz4", "lzma", "cab", "jar",
                "jpg", "jpeg", "png", "gif", "webp", "heic", "mp3", "aac", "ogg", "flac", "mp4",
                "m4v", "mkv", "avi", "mov", "webm", "pdf", "docx", "xlsx", "pptx",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend: "memory" or "fs"
    pub backend: String,
    /// Root directory for the fs backend
    pub root: PathBuf,
    /// Key prefix for chunk objects inside the backend
    pub prefix: String,
    /// Retry budget of the store adapter (the engine itself never retries)
    pub max_retries: usize,
    /// Concurrent chunk puts/gets issued by the engine
    pub write_concurrency: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: "memory".into(),
            root: PathBuf::from("/var/lib/selfcrypt"),
            prefix: "chunks".into(),
            max_retries: 3,
            write_concurrency: 8,
        }
    }
}

impl SelfCryptConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> SelfCryptResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SelfCryptError::Config(format!("reading config {}: {e}", path.display()))
        })?;
        let config: SelfCryptConfig = toml::from_str(&content).map_err(|e| {
            SelfCryptError::Config(format!("parsing config {}: {e}", path.display()))
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> SelfCryptResult<()> {
        self.chunking.validate()?;

        let c = &self.compression;
        if !(c.max_ratio > 0.0 && c.max_ratio <= 1.0) {
            return Err(SelfCryptError::Config(format!(
                "compression.max_ratio must be in (0, 1], got {}",
                c.max_ratio
            )));
        }
        if c.sample_size == 0 {
            return Err(SelfCryptError::Config("compression.sample_size must be > 0".into()));
        }

        let s = &self.store;
        if s.backend != "memory" && s.backend != "fs" {
            return Err(SelfCryptError::Config(format!(
                "store.backend must be \"memory\" or \"fs\", got {:?}",
                s.backend
            )));
        }
        if s.write_concurrency == 0 {
            return Err(SelfCryptError::Config("store.write_concurrency must be > 0".into()));
        }
        Ok(())
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> SelfCryptResult<()> {
        if self.default_chunk_size == 0 {
            return Err(SelfCryptError::Config("chunking.default_chunk_size must be > 0".into()));
        }
        if self.min_chunks == 0 {
            return Err(SelfCryptError::Config("chunking.min_chunks must be > 0".into()));
        }
        if self.max_chunks < self.min_chunks {
            return Err(SelfCryptError::Config(format!(
                "chunking.max_chunks ({}) is below min_chunks ({})",
                self.max_chunks, self.min_chunks
            )));
        }
        if self.chunklet_size == 0 {
            return Err(SelfCryptError::Config("chunking.chunklet_size must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[chunking]
default_chunk_size = 1048576
min_chunks = 4
max_chunks = 64
chunklet_size = 2

[compression]
enabled = false
level = 9
sample_size = 4096
max_ratio = 0.5
skip_extensions = ["zip"]

[store]
backend = "fs"
root = "/tmp/selfcrypt"
prefix = "c"
max_retries = 0
write_concurrency = 2
"#;
        let config: SelfCryptConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(config.chunking.default_chunk_size, 1048576);
        assert_eq!(config.chunking.min_chunks, 4);
        assert_eq!(config.chunking.max_chunks, 64);
        assert_eq!(config.chunking.chunklet_size, 2);
        assert!(!config.compression.enabled);
        assert_eq!(config.compression.level, 9);
        assert_eq!(config.compression.skip_extensions, vec!["zip".to_string()]);
        assert_eq!(config.store.backend, "fs");
        assert_eq!(config.store.root, PathBuf::from("/tmp/selfcrypt"));
        assert_eq!(config.store.write_concurrency, 2);
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_defaults() {
        let config: SelfCryptConfig = toml::from_str("").unwrap();

        assert_eq!(config.chunking, ChunkingConfig::default());
        assert_eq!(config.chunking.min_chunks, 3);
        assert!(config.compression.enabled);
        assert!(config.compression.skip_extensions.iter().any(|e| e == "7z"));
        assert_eq!(config.store.backend, "memory");
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
[chunking]
chunklet_size = 64
"#;
        let config: SelfCryptConfig = toml::from_str(toml_str).unwrap();

        // Overridden
        assert_eq!(config.chunking.chunklet_size, 64);
        // Defaults
        assert_eq!(config.chunking.default_chunk_size, 256 * 1024);
        assert_eq!(config.store.prefix, "chunks");
    }

    #[test]
    fn test_validate_rejects_bad_thresholds() {
        let mut config = SelfCryptConfig::default();
        config.chunking.max_chunks = 2;
        assert!(matches!(config.validate(), Err(SelfCryptError::Config(_))));

        let mut config = SelfCryptConfig::default();
        config.chunking.chunklet_size = 0;
        assert!(config.validate().is_err());

        let mut config = SelfCryptConfig::default();
        config.compression.max_ratio = 1.5;
        assert!(config.validate().is_err());

        let mut config = SelfCryptConfig::default();
        config.store.backend = "s3".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("selfcrypt.toml");
        std::fs::write(&path, "[store]\nwrite_concurrency = 3\n").unwrap();

        let config = SelfCryptConfig::load(&path).unwrap();
        assert_eq!(config.store.write_concurrency, 3);

        std::fs::write(&path, "[store]\nwrite_concurrency = 0\n").unwrap();
        assert!(SelfCryptConfig::load(&path).is_err());

        let missing = SelfCryptConfig::load(&dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(SelfCryptError::Config(_))));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = SelfCryptConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: SelfCryptConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.chunking, parsed.chunking);
        assert_eq!(config.store.backend, parsed.store.backend);
        assert_eq!(config.compression.skip_extensions, parsed.compression.skip_extensions);
    }
}
