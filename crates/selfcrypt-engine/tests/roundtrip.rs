//! Integration test: encrypt → decrypt round-trips through real stores
//!
//! Covers file and memory sources, compressible and incompressible content,
//! the in-process MemoryStore and OpenDAL memory/fs backends.

use opendal::Operator;
use rand::{rngs::StdRng, RngCore, SeedableRng};
use selfcrypt_chunks::{FileSource, MemorySource};
use selfcrypt_core::{ChunkingConfig, DataMap, SelfCryptConfig, SelfCryptError, StoreConfig};
use selfcrypt_crypto::digest;
use selfcrypt_engine::{DecryptOptions, SelfEncryptor};
use selfcrypt_storage::{ChunkStore, MemoryStore, OpendalStore};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn memory_engine() -> (SelfEncryptor, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let se = SelfEncryptor::builder()
        .store(store.clone())
        .build()
        .expect("engine");
    (se, store)
}

fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    StdRng::seed_from_u64(seed).fill_bytes(&mut buf);
    buf
}

fn write_test_file(dir: &Path, name: &str, content: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write test file");
    path
}

fn assert_unique_names(dm: &DataMap) {
    let names: HashSet<&String> = dm.chunk_names.iter().collect();
    assert_eq!(names.len(), dm.chunk_count(), "duplicate chunk names: {dm:?}");
}

#[tokio::test]
async fn roundtrip_small_file() {
    let tmp = TempDir::new().unwrap();
    let (se, _) = memory_engine();

    let original = b"hello world, this is a small test file for a self-encryption round-trip";
    let src = write_test_file(tmp.path(), "small.txt", original);
    let dst = tmp.path().join("output/small.txt");

    let out = se.encrypt_file(&src).await.expect("encrypt file");
    assert_eq!(out.data_map.file_hash, digest(original));
    assert_eq!(out.data_map.chunk_count(), 3);

    let written = se
        .decrypt_to_path(&out.data_map, &dst, DecryptOptions::default())
        .await
        .expect("decrypt to path");

    assert_eq!(written, original.len() as u64);
    assert_eq!(std::fs::read(&dst).unwrap(), original);
}

#[tokio::test]
async fn roundtrip_incompressible_binary() {
    let (se, store) = memory_engine();
    let original = random_bytes(256 * 1024, 1);

    let out = se.encrypt_bytes(original.clone()).await.unwrap();
    let dm = &out.data_map;

    assert!(!dm.compressed, "random bytes should not be compressed");
    assert_eq!(dm.chunk_count(), 3);
    assert_eq!(dm.total_size(), Some(original.len() as u64));
    assert_eq!(store.len().unwrap(), 3);
    assert_eq!(out.bytes_written, original.len() as u64);
    assert_unique_names(dm);

    assert_eq!(se.decrypt(dm).await.unwrap(), original);
}

#[tokio::test]
async fn roundtrip_compressible_text() {
    let (se, _) = memory_engine();
    let original = "The quick brown fox jumps over the lazy dog. "
        .repeat(20_000)
        .into_bytes();

    let out = se.encrypt_bytes(original.clone()).await.unwrap();
    assert!(out.data_map.compressed);
    assert!(out.data_map.total_size().unwrap() < original.len() as u64 / 10);

    assert_eq!(se.decrypt(&out.data_map).await.unwrap(), original);
}

#[tokio::test]
async fn roundtrip_two_random_bytes() {
    let (se, store) = memory_engine();
    let original = random_bytes(2, 2);

    let out = se.encrypt_bytes(original.clone()).await.unwrap();
    let dm = &out.data_map;

    assert_eq!(dm.chunk_sizes, vec![0, 0, 2]);
    assert_unique_names(dm);
    for name in &dm.chunk_names {
        assert!(store.exists(name).await.unwrap(), "missing {name}");
    }

    assert_eq!(se.decrypt(dm).await.unwrap(), original);
}

#[tokio::test]
async fn identical_content_converges() {
    let (a, store_a) = memory_engine();
    let (b, store_b) = memory_engine();
    let content = random_bytes(1024, 3);

    let out_a = a.encrypt_bytes(content.clone()).await.unwrap();
    let out_b = b.encrypt_bytes(content).await.unwrap();

    assert_eq!(out_a.data_map, out_b.data_map);
    assert_eq!(store_a.names().unwrap(), store_b.names().unwrap());
}

#[tokio::test]
async fn different_content_diverges() {
    let (se, _) = memory_engine();
    let a = se.encrypt_bytes(random_bytes(1024, 4)).await.unwrap();
    let b = se.encrypt_bytes(random_bytes(1024, 5)).await.unwrap();

    assert_ne!(a.data_map.file_hash, b.data_map.file_hash);
    let shared = a
        .data_map
        .chunk_names
        .iter()
        .filter(|n| b.data_map.chunk_names.contains(n))
        .count();
    assert_eq!(shared, 0);
}

#[tokio::test]
async fn file_and_memory_sources_agree() {
    let tmp = TempDir::new().unwrap();
    let (se, _) = memory_engine();
    let content = random_bytes(4096, 6);
    let path = write_test_file(tmp.path(), "data.bin", &content);

    let from_file = se
        .encrypt(FileSource::open(&path).unwrap(), None)
        .await
        .unwrap();
    let from_memory = se
        .encrypt(MemorySource::new(content).with_name("data.bin"), None)
        .await
        .unwrap();

    assert_eq!(from_file.data_map, from_memory.data_map);
}

#[tokio::test]
async fn preseeded_hash_matches_computed() {
    let (se, _) = memory_engine();
    let content = b"content whose hash the caller already knows".to_vec();
    let known = digest(&content);

    let computed = se.encrypt_bytes(content.clone()).await.unwrap();
    let seeded = se
        .encrypt(MemorySource::new(content), Some(known))
        .await
        .unwrap();

    assert_eq!(computed.data_map, seeded.data_map);
}

#[tokio::test]
async fn preseeded_hash_must_match_content() {
    let (se, store) = memory_engine();
    let wrong = digest(b"some other content");

    let err = se
        .encrypt(MemorySource::new(b"real content of the file".to_vec()), Some(wrong))
        .await
        .unwrap_err();

    assert!(matches!(err, SelfCryptError::InvalidManifest(_)), "{err}");
    assert!(store.is_empty().unwrap(), "no chunk may be written for a rejected hash");
}

#[tokio::test]
async fn denied_extension_skips_compression() {
    let (se, _) = memory_engine();
    let content = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".repeat(1000).into_bytes();

    let named = se
        .encrypt(MemorySource::new(content.clone()).with_name("archive.ZIP"), None)
        .await
        .unwrap();
    let unnamed = se.encrypt_bytes(content.clone()).await.unwrap();

    assert!(!named.data_map.compressed);
    assert!(unnamed.data_map.compressed);
    assert_eq!(se.decrypt(&named.data_map).await.unwrap(), content);
}

#[tokio::test]
async fn chunk_count_capped_by_max_chunks() {
    let store = Arc::new(MemoryStore::new());
    let config = SelfCryptConfig {
        chunking: ChunkingConfig {
            default_chunk_size: 1024,
            ..ChunkingConfig::default()
        },
        ..SelfCryptConfig::default()
    };
    let se = SelfEncryptor::builder()
        .config(config)
        .store(store.clone())
        .build()
        .unwrap();
    let original = random_bytes(200 * 1024, 7);

    let out = se.encrypt_bytes(original.clone()).await.unwrap();
    assert_eq!(out.data_map.chunk_count(), 40);
    assert_unique_names(&out.data_map);
    assert_eq!(se.decrypt(&out.data_map).await.unwrap(), original);
}

#[tokio::test]
async fn small_chunklets_roundtrip() {
    let config = SelfCryptConfig {
        chunking: ChunkingConfig {
            default_chunk_size: 64,
            min_chunks: 3,
            max_chunks: 40,
            chunklet_size: 2,
        },
        ..SelfCryptConfig::default()
    };
    let se = SelfEncryptor::builder()
        .config(config)
        .store(Arc::new(MemoryStore::new()))
        .build()
        .unwrap();
    let original = random_bytes(5000, 8);

    let out = se.encrypt_bytes(original.clone()).await.unwrap();
    assert_eq!(out.data_map.chunk_count(), 40);
    assert_eq!(se.decrypt(&out.data_map).await.unwrap(), original);
}

#[tokio::test]
async fn roundtrip_opendal_memory_backend() {
    let op = Operator::new(opendal::services::Memory::default())
        .expect("memory operator")
        .finish();
    let se = SelfEncryptor::builder()
        .store(Arc::new(OpendalStore::new(op, "test/chunks")))
        .build()
        .unwrap();
    let original = random_bytes(64 * 1024, 9);

    let out = se.encrypt_bytes(original.clone()).await.unwrap();
    se.verify(&out.data_map).await.unwrap();
    assert_eq!(se.decrypt(&out.data_map).await.unwrap(), original);
}

#[tokio::test]
async fn roundtrip_fs_backend_from_config() {
    let tmp = TempDir::new().unwrap();
    let config = SelfCryptConfig {
        store: StoreConfig {
            backend: "fs".into(),
            root: tmp.path().join("store"),
            ..StoreConfig::default()
        },
        ..SelfCryptConfig::default()
    };
    let se = SelfEncryptor::from_config(config).unwrap();
    let original = random_bytes(10_000, 10);

    let out = se.encrypt_bytes(original.clone()).await.unwrap();
    for name in &out.data_map.chunk_names {
        assert!(tmp.path().join("store/chunks").join(name).exists());
    }

    // A second engine over the same directory sees the same chunks
    let config = SelfCryptConfig {
        store: StoreConfig {
            backend: "fs".into(),
            root: tmp.path().join("store"),
            ..StoreConfig::default()
        },
        ..SelfCryptConfig::default()
    };
    let reopened = SelfEncryptor::from_config(config).unwrap();
    assert_eq!(reopened.decrypt(&out.data_map).await.unwrap(), original);
}

#[tokio::test]
async fn datamap_survives_serialization() {
    let (se, _) = memory_engine();
    let original = random_bytes(3000, 11);
    let out = se.encrypt_bytes(original.clone()).await.unwrap();

    let restored = DataMap::from_bytes(&out.data_map.to_bytes().unwrap()).unwrap();
    assert_eq!(se.decrypt(&restored).await.unwrap(), original);
}

#[tokio::test]
async fn decrypt_to_writer_collects_content() {
    let (se, _) = memory_engine();
    let original = random_bytes(777, 12);
    let out = se.encrypt_bytes(original.clone()).await.unwrap();

    let mut sink: Vec<u8> = Vec::new();
    let n = se.decrypt_to_writer(&out.data_map, &mut sink).await.unwrap();
    assert_eq!(n, 777);
    assert_eq!(sink, original);
}

#[tokio::test]
async fn decrypt_to_path_offset_and_overwrite() {
    let tmp = TempDir::new().unwrap();
    let (se, _) = memory_engine();
    let original = b"0123456789abcdefghijklmnopqrstuvwxyz".to_vec();
    let out = se.encrypt_bytes(original.clone()).await.unwrap();
    let dst = tmp.path().join("out.txt");

    let n = se
        .decrypt_to_path(&out.data_map, &dst, DecryptOptions { offset: 10, overwrite: false })
        .await
        .unwrap();
    assert_eq!(n, 26);
    assert_eq!(std::fs::read(&dst).unwrap(), &original[10..]);

    let err = se
        .decrypt_to_path(&out.data_map, &dst, DecryptOptions::default())
        .await
        .unwrap_err();
    assert!(
        matches!(&err, SelfCryptError::Io(e) if e.kind() == std::io::ErrorKind::AlreadyExists),
        "{err}"
    );

    se.decrypt_to_path(&out.data_map, &dst, DecryptOptions { offset: 0, overwrite: true })
        .await
        .unwrap();
    assert_eq!(std::fs::read(&dst).unwrap(), original);

    let err = se
        .decrypt_to_path(&out.data_map, &dst, DecryptOptions { offset: 37, overwrite: true })
        .await
        .unwrap_err();
    assert!(matches!(err, SelfCryptError::Io(_)));
    assert_eq!(std::fs::read(&dst).unwrap(), original, "failed call must not touch output");
}
