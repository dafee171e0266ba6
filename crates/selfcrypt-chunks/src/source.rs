//! Byte sources: read-only access to the content being encrypted
//!
//! One trait, two variants (file on disk, buffer in memory). The name is only
//! used for extension hints by the compressibility classifier.

use bytes::Bytes;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Read size used by [`ByteSource::read_all`]
const READ_BLOCK: usize = 1024 * 1024;

/// Random-access, read-only content.
pub trait ByteSource: Send + Sync {
    /// Total content length in bytes.
    fn len(&self) -> io::Result<u64>;

    /// Read up to `len` bytes starting at `offset`. Short at end of content.
    fn read_range(&self, offset: u64, len: usize) -> io::Result<Vec<u8>>;

    /// File name or other label, if any.
    fn name(&self) -> Option<&str>;

    fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Lowercase extension of [`name`](Self::name), without the dot.
    fn extension(&self) -> Option<String> {
        let name = self.name()?;
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    /// Read the whole content.
    fn read_all(&self) -> io::Result<Vec<u8>> {
        let total = self.len()?;
        let mut out = Vec::with_capacity(total as usize);
        let mut offset = 0u64;
        while offset < total {
            let want = (total - offset).min(READ_BLOCK as u64) as usize;
            let block = self.read_range(offset, want)?;
            if block.is_empty() {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("source ended at {offset} of {total} bytes"),
                ));
            }
            offset += block.len() as u64;
            out.extend_from_slice(&block);
        }
        Ok(out)
    }
}

/// Content held in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Bytes,
    name: Option<String>,
}

impl MemorySource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            name: None,
        }
    }

    /// Attach a name, e.g. to carry a file extension hint.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl ByteSource for MemorySource {
    fn len(&self) -> io::Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn read_range(&self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let start = (offset.min(self.data.len() as u64)) as usize;
        let end = start.saturating_add(len).min(self.data.len());
        Ok(self.data[start..end].to_vec())
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Content read from a file on disk. Each read opens the file, so the source
/// is freely shareable across threads.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
    len: u64,
}

impl FileSource {
    pub fn open(path: &Path) -> io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            ));
        }
        Ok(Self {
            path: path.to_path_buf(),
            name: path.to_string_lossy().into_owned(),
            len: meta.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    fn len(&self) -> io::Result<u64> {
        Ok(self.len)
    }

    fn read_range(&self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut out = Vec::with_capacity(len);
        file.take(len as u64).read_to_end(&mut out)?;
        Ok(out)
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}
