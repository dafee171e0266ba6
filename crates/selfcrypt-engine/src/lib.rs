//! selfcrypt-engine: convergent self-encryption over a content-addressed store
//!
//! ```no_run
//! # async fn demo() -> selfcrypt_core::SelfCryptResult<()> {
//! use std::sync::Arc;
//! use selfcrypt_engine::SelfEncryptor;
//! use selfcrypt_storage::MemoryStore;
//!
//! let se = SelfEncryptor::builder()
//!     .store(Arc::new(MemoryStore::new()))
//!     .build()?;
//! let out = se.encrypt_bytes(&b"some content"[..]).await?;
//! let back = se.decrypt(&out.data_map).await?;
//! assert_eq!(back, b"some content");
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod pipeline;
pub mod state;

pub use engine::{DecryptOptions, Encrypted, ProgressFn, SelfEncryptor, SelfEncryptorBuilder};
pub use state::EngineState;
