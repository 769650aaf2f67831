//! Streaming byte buffers.
//!
//! All input and output passes through a [`ReadBuffer`] or a [`WriteBuffer`].
//! A buffer wraps a [`Source`] or [`Sink`] that supplies a raw transfer
//! callback and, optionally, a cache callback handing out windows of data.
//! Short transfers from callbacks are retried internally; only a zero-byte
//! transfer is treated as end of stream.

mod backends;

pub use backends::{FileSink, FileSource, MemorySource, VecSink};

use std::io;

use crate::error::{Error, Result};

/// Outcome of a buffered transfer that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The whole request was transferred.
    Ok,
    /// End of stream was reached before the request was satisfied.
    Eof,
}

/// Number of bytes moved by a read or write, plus its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    /// Bytes actually transferred.
    pub actual: usize,
    /// `Eof` when `actual` is less than requested.
    pub status: Status,
}

impl Transfer {
    fn new(requested: usize, actual: usize) -> Self {
        let status = if actual == requested {
            Status::Ok
        } else {
            Status::Eof
        };
        Self { actual, status }
    }

    /// Returns true if end of stream was reached.
    pub fn is_eof(&self) -> bool {
        self.status == Status::Eof
    }
}

/// Producer of bytes for a [`ReadBuffer`].
pub trait Source {
    /// Reads up to `dest.len()` bytes. Returning `Ok(0)` means end of stream;
    /// short reads are allowed.
    fn read(&mut self, dest: &mut [u8]) -> io::Result<usize>;

    /// Whether [`Source::fill_cache`] is implemented.
    fn has_cache(&self) -> bool {
        false
    }

    /// Replaces `cache` with the next window of data. Leaving `cache` empty
    /// means end of stream.
    fn fill_cache(&mut self, cache: &mut Vec<u8>) -> io::Result<()> {
        cache.clear();
        Ok(())
    }

    /// Called once when the buffer is closed.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Consumer of bytes for a [`WriteBuffer`].
pub trait Sink {
    /// Writes up to `src.len()` bytes. Returning `Ok(0)` means the sink is
    /// full; short writes are allowed.
    fn write(&mut self, src: &[u8]) -> io::Result<usize>;

    /// Whether [`Sink::cache_size`] is implemented.
    fn has_cache(&self) -> bool {
        false
    }

    /// Size of the next cache window. Everything written to the previous
    /// window has already been passed to [`Sink::write`]. Zero means the
    /// sink is full.
    fn cache_size(&mut self) -> io::Result<usize> {
        Ok(0)
    }

    /// Called once when the buffer is closed, after the final flush.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn read(&mut self, dest: &mut [u8]) -> io::Result<usize> {
        (**self).read(dest)
    }

    fn has_cache(&self) -> bool {
        (**self).has_cache()
    }

    fn fill_cache(&mut self, cache: &mut Vec<u8>) -> io::Result<()> {
        (**self).fill_cache(cache)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn write(&mut self, src: &[u8]) -> io::Result<usize> {
        (**self).write(src)
    }

    fn has_cache(&self) -> bool {
        (**self).has_cache()
    }

    fn cache_size(&mut self) -> io::Result<usize> {
        (**self).cache_size()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Buffered reader over a [`Source`].
#[derive(Debug)]
pub struct ReadBuffer<S: Source> {
    source: S,
    cache: Vec<u8>,
    cache_pos: usize,
    /// Bytes consumed, not counting `cache_pos`.
    pos: u64,
    closed: bool,
}

impl<S: Source> ReadBuffer<S> {
    /// Creates a read buffer over `source`.
    pub fn open(source: S) -> Self {
        Self {
            source,
            cache: Vec::new(),
            cache_pos: 0,
            pos: 0,
            closed: false,
        }
    }

    /// Reads `dest.len()` bytes unless end of stream is reached first.
    pub fn read(&mut self, dest: &mut [u8]) -> Result<Transfer> {
        if self.closed {
            return Err(Error::Eof("read from closed buffer".to_string()));
        }
        let numbytes = dest.len();
        let mut pos = 0;

        while pos < numbytes {
            let available = self.cache.len() - self.cache_pos;
            if available > 0 {
                let n = available.min(numbytes - pos);
                dest[pos..pos + n]
                    .copy_from_slice(&self.cache[self.cache_pos..self.cache_pos + n]);
                pos += n;
                self.cache_pos += n;
                continue;
            }

            let last_cache = self.cache.len();
            let direct = !self.source.has_cache()
                || (last_cache > 0 && numbytes - pos > last_cache / 2);
            if direct {
                log::trace!("direct read of {} bytes", numbytes - pos);
                let actual = self.source.read(&mut dest[pos..])?;
                if actual == 0 {
                    break;
                }
                pos += actual;
                self.pos += actual as u64;
            } else {
                self.pos += self.cache_pos as u64;
                self.cache_pos = 0;
                self.source.fill_cache(&mut self.cache)?;
                log::trace!("cache refilled with {} bytes", self.cache.len());
                if self.cache.is_empty() {
                    break;
                }
            }
        }

        Ok(Transfer::new(numbytes, pos))
    }

    /// Number of bytes delivered to callers so far.
    pub fn position(&self) -> u64 {
        self.pos + self.cache_pos as u64
    }

    /// Calls the source's close hook. Repeated calls do nothing.
    pub fn close(&mut self) -> Result<Status> {
        if self.closed {
            return Ok(Status::Ok);
        }
        self.closed = true;
        self.source.close()?;
        Ok(Status::Ok)
    }

    /// Consumes the buffer and returns the source.
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: Source> io::Read for ReadBuffer<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        ReadBuffer::read(self, buf)
            .map(|t| t.actual)
            .map_err(into_io_error)
    }
}

/// Buffered writer over a [`Sink`].
#[derive(Debug)]
pub struct WriteBuffer<S: Sink> {
    sink: S,
    /// Current cache window; `cache.len()` is the window size.
    cache: Vec<u8>,
    cache_pos: usize,
    /// Size of the last window handed out by the sink.
    last_cache: usize,
    /// Bytes accepted by the sink, not counting `cache_pos`.
    pos: u64,
    closed: bool,
}

impl<S: Sink> WriteBuffer<S> {
    /// Creates a write buffer over `sink`.
    pub fn open(sink: S) -> Self {
        Self {
            sink,
            cache: Vec::new(),
            cache_pos: 0,
            last_cache: 0,
            pos: 0,
            closed: false,
        }
    }

    /// Writes all of `src` unless the sink reports it is full first.
    pub fn write(&mut self, src: &[u8]) -> Result<Transfer> {
        if self.closed {
            return Err(Error::Eof("write to closed buffer".to_string()));
        }
        let numbytes = src.len();
        let mut pos = 0;

        while pos < numbytes {
            let room = self.cache.len() - self.cache_pos;
            if room > 0 {
                let n = room.min(numbytes - pos);
                self.cache[self.cache_pos..self.cache_pos + n].copy_from_slice(&src[pos..pos + n]);
                pos += n;
                self.cache_pos += n;
                continue;
            }

            let pending = self.cache_pos;
            let flushed = self.flush_cache()?;
            if flushed != pending {
                // Bytes of this request still in the lost window were never delivered.
                let lost = pending - flushed;
                log::debug!("cache flush stopped after {} of {} bytes", flushed, pending);
                return Ok(Transfer::new(numbytes, pos.saturating_sub(lost)));
            }

            let direct = !self.sink.has_cache()
                || (self.last_cache > 0 && numbytes - pos > self.last_cache / 2);
            if direct {
                log::trace!("direct write of {} bytes", numbytes - pos);
                let actual = self.sink.write(&src[pos..])?;
                if actual == 0 {
                    break;
                }
                pos += actual;
                self.pos += actual as u64;
            } else {
                let size = self.sink.cache_size()?;
                log::trace!("new cache window of {} bytes", size);
                if size == 0 {
                    break;
                }
                self.cache.clear();
                self.cache.try_reserve_exact(size)?;
                self.cache.resize(size, 0);
                self.cache_pos = 0;
                self.last_cache = size;
            }
        }

        Ok(Transfer::new(numbytes, pos))
    }

    /// Writes all of `src`, treating end of stream as an error.
    pub fn write_all(&mut self, src: &[u8]) -> Result<()> {
        let transfer = self.write(src)?;
        if transfer.is_eof() {
            return Err(Error::Eof(format!(
                "sink accepted {} of {} bytes",
                transfer.actual,
                src.len()
            )));
        }
        Ok(())
    }

    /// Number of bytes written by callers so far, including bytes still
    /// held in the cache window.
    pub fn position(&self) -> u64 {
        self.pos + self.cache_pos as u64
    }

    /// Sends the cache window to the sink, looping over short writes.
    /// Returns the number of bytes the sink accepted; the window is
    /// discarded either way.
    fn flush_cache(&mut self) -> Result<usize> {
        let pending = self.cache_pos;
        let mut done = 0;
        while done < pending {
            let actual = self.sink.write(&self.cache[done..pending])?;
            if actual == 0 {
                log::warn!("sink reached end of stream while flushing cache");
                break;
            }
            done += actual;
            self.pos += actual as u64;
        }
        self.cache.clear();
        self.cache_pos = 0;
        Ok(done)
    }

    /// Flushes any cached bytes and calls the sink's close hook.
    ///
    /// Returns `Status::Eof` if the sink could not take every cached byte.
    /// Repeated calls do nothing.
    pub fn close(&mut self) -> Result<Status> {
        if self.closed {
            return Ok(Status::Ok);
        }
        self.closed = true;
        let pending = self.cache_pos;
        let flushed = self.flush_cache()?;
        if flushed != pending {
            return Ok(Status::Eof);
        }
        self.sink.close()?;
        Ok(Status::Ok)
    }

    /// Returns a reference to the sink.
    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    /// Consumes the buffer and returns the sink. Cached bytes are discarded
    /// unless [`WriteBuffer::close`] was called first.
    pub fn into_inner(self) -> S {
        self.sink
    }
}

impl<S: Sink> io::Write for WriteBuffer<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let transfer = WriteBuffer::write(self, buf).map_err(into_io_error)?;
        if transfer.actual == 0 && !buf.is_empty() {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "sink is full"));
        }
        Ok(transfer.actual)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn into_io_error(err: Error) -> io::Error {
    match err {
        Error::Io(e) => e,
        Error::Eof(msg) => io::Error::new(io::ErrorKind::UnexpectedEof, msg),
        other => io::Error::new(io::ErrorKind::Other, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Source that hands out at most `chunk` bytes per call.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        chunk: usize,
        cached: bool,
    }

    impl Source for Trickle {
        fn read(&mut self, dest: &mut [u8]) -> io::Result<usize> {
            let n = self.chunk.min(dest.len()).min(self.data.len() - self.pos);
            dest[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }

        fn has_cache(&self) -> bool {
            self.cached
        }

        fn fill_cache(&mut self, cache: &mut Vec<u8>) -> io::Result<()> {
            let n = self.chunk.min(self.data.len() - self.pos);
            cache.clear();
            cache.extend_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(())
        }
    }

    #[test]
    fn test_short_reads_are_retried() {
        let source = Trickle {
            data: b"hello world".to_vec(),
            pos: 0,
            chunk: 3,
            cached: false,
        };
        let mut buffer = ReadBuffer::open(source);
        let mut dest = [0u8; 8];
        let t = buffer.read(&mut dest).unwrap();
        assert_eq!(t, Transfer { actual: 8, status: Status::Ok });
        assert_eq!(&dest, b"hello wo");
        assert_eq!(buffer.position(), 8);

        let t = buffer.read(&mut dest).unwrap();
        assert_eq!(t.actual, 3);
        assert!(t.is_eof());
        assert_eq!(&dest[..3], b"rld");
        assert_eq!(buffer.position(), 11);
    }

    #[test]
    fn test_cached_read_position() {
        let source = Trickle {
            data: (0u8..50).collect(),
            pos: 0,
            chunk: 7,
            cached: true,
        };
        let mut buffer = ReadBuffer::open(source);
        let mut dest = [0u8; 2];
        buffer.read(&mut dest).unwrap();
        assert_eq!(buffer.position(), 2);
        buffer.read(&mut dest).unwrap();
        assert_eq!(dest, [2, 3]);
        assert_eq!(buffer.position(), 4);
    }

    #[test]
    fn test_memory_source() {
        let mut buffer = ReadBuffer::open(MemorySource::new(b"abcdef".to_vec()));
        let mut dest = [0u8; 4];
        assert_eq!(buffer.read(&mut dest).unwrap().actual, 4);
        assert_eq!(&dest, b"abcd");
        let t = buffer.read(&mut dest).unwrap();
        assert_eq!(t.actual, 2);
        assert!(t.is_eof());
        assert_eq!(buffer.close().unwrap(), Status::Ok);
        assert_eq!(buffer.close().unwrap(), Status::Ok);
    }

    #[test]
    fn test_write_cache_flushed_on_close() {
        let mut buffer = WriteBuffer::open(VecSink::with_cache(4));
        buffer.write_all(b"0123456789").unwrap();
        assert_eq!(buffer.position(), 10);
        assert_eq!(buffer.close().unwrap(), Status::Ok);
        assert_eq!(buffer.into_inner().into_bytes(), b"0123456789");
    }

    #[test]
    fn test_write_after_close_fails() {
        let mut buffer = WriteBuffer::open(VecSink::new());
        buffer.close().unwrap();
        assert!(matches!(buffer.write(b"x"), Err(Error::Eof(_))));
    }

    /// Sink that accepts a fixed number of bytes in total.
    struct Bounded {
        data: Vec<u8>,
        capacity: usize,
    }

    impl Sink for Bounded {
        fn write(&mut self, src: &[u8]) -> io::Result<usize> {
            let n = src.len().min(self.capacity - self.data.len());
            self.data.extend_from_slice(&src[..n]);
            Ok(n)
        }
    }

    #[test]
    fn test_full_sink_reports_eof() {
        let mut buffer = WriteBuffer::open(Bounded {
            data: Vec::new(),
            capacity: 5,
        });
        let t = buffer.write(b"abcdefgh").unwrap();
        assert_eq!(t.actual, 5);
        assert!(t.is_eof());
        assert!(matches!(buffer.write_all(b"z"), Err(Error::Eof(_))));
        assert_eq!(buffer.position(), 5);
    }
}
