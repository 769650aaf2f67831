//! File and memory backends for buffers.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use super::{Sink, Source};

/// Reads from a file with no cache callback.
#[derive(Debug)]
pub struct FileSource {
    file: File,
}

impl FileSource {
    /// Opens `path` for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            io::Error::new(e.kind(), format!("failed to open '{}': {}", path.display(), e))
        })?;
        Ok(Self { file })
    }
}

impl Source for FileSource {
    fn read(&mut self, dest: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.file.read(dest) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }
}

/// Writes to a file with no cache callback.
#[derive(Debug)]
pub struct FileSink {
    file: File,
}

impl FileSink {
    /// Creates or truncates `path` for writing.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            io::Error::new(e.kind(), format!("failed to create '{}': {}", path.display(), e))
        })?;
        Ok(Self { file })
    }
}

impl Sink for FileSink {
    fn write(&mut self, src: &[u8]) -> io::Result<usize> {
        loop {
            match self.file.write(src) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Serves a single block of memory.
///
/// The whole block is handed out as one cache window, after which the
/// source is at end of stream.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Vec<u8>,
    pos: usize,
}

impl MemorySource {
    /// Creates a source over `data`.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }
}

impl Source for MemorySource {
    fn read(&mut self, dest: &mut [u8]) -> io::Result<usize> {
        let n = dest.len().min(self.data.len() - self.pos);
        dest[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn has_cache(&self) -> bool {
        true
    }

    fn fill_cache(&mut self, cache: &mut Vec<u8>) -> io::Result<()> {
        cache.clear();
        cache.extend_from_slice(&self.data[self.pos..]);
        self.pos = self.data.len();
        Ok(())
    }
}

/// Growable in-memory sink.
#[derive(Debug, Clone, Default)]
pub struct VecSink {
    data: Vec<u8>,
    window: Option<usize>,
}

impl VecSink {
    /// Creates an empty sink without a cache callback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty sink that hands out cache windows of `window` bytes.
    pub fn with_cache(window: usize) -> Self {
        Self {
            data: Vec::new(),
            window: Some(window),
        }
    }

    /// Bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the sink, returning the bytes written.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl Sink for VecSink {
    fn write(&mut self, src: &[u8]) -> io::Result<usize> {
        self.data
            .try_reserve(src.len())
            .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;
        self.data.extend_from_slice(src);
        Ok(src.len())
    }

    fn has_cache(&self) -> bool {
        self.window.is_some()
    }

    fn cache_size(&mut self) -> io::Result<usize> {
        Ok(self.window.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{ReadBuffer, WriteBuffer};

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");

        let mut out = WriteBuffer::open(FileSink::create(&path).unwrap());
        out.write_all(b"page span char").unwrap();
        out.close().unwrap();

        let mut input = ReadBuffer::open(FileSource::open(&path).unwrap());
        let mut dest = vec![0u8; 32];
        let t = input.read(&mut dest).unwrap();
        assert_eq!(&dest[..t.actual], b"page span char");
        assert!(t.is_eof());
    }

    #[test]
    fn test_open_missing_file() {
        let err = FileSource::open("/nonexistent/glyphdocx/input.xml").unwrap_err();
        assert!(err.to_string().contains("failed to open"));
    }
}
