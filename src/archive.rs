//! Store-only ZIP archive writer.
//!
//! Entries are written uncompressed as a local file header followed by the
//! raw bytes. The central directory is kept in memory and emitted by
//! [`ZipWriter::close`].

use std::io;

use flate2::Crc;

use crate::buffer::{Sink, WriteBuffer};
use crate::error::{Error, Result};

const LOCAL_HEADER_SIG: u32 = 0x0403_4b50;
const CENTRAL_HEADER_SIG: u32 = 0x0201_4b50;
const END_OF_CENTRAL_DIR_SIG: u32 = 0x0605_4b50;

/// ZIP 1.0: stored entries only.
const VERSION: u16 = 10;
const METHOD_STORE: u16 = 0;
/// 00:00:00
const DOS_TIME: u16 = 0;
/// 1980-01-01
const DOS_DATE: u16 = (1 << 5) | 1;

const ARCHIVE_COMMENT: &[u8] = b"glyphdocx";

/// General-purpose flag bit 11: the entry name is UTF-8.
const FLAG_UTF8_NAME: u16 = 1 << 11;

fn name_flags(name: &str) -> u16 {
    if name.is_ascii() {
        0
    } else {
        FLAG_UTF8_NAME
    }
}

/// Central directory record for an entry already written.
#[derive(Debug, Clone)]
struct CentralEntry {
    name: String,
    crc: u32,
    size: u32,
    offset: u32,
}

/// Failure class remembered after a write fails.
#[derive(Debug, Clone)]
enum Poison {
    Io(io::ErrorKind, String),
    Eof(String),
}

impl Poison {
    fn to_error(&self) -> Error {
        match self {
            Poison::Io(kind, msg) => Error::Io(io::Error::new(*kind, msg.clone())),
            Poison::Eof(msg) => Error::Eof(msg.clone()),
        }
    }
}

/// Writes a store-only ZIP archive into a [`WriteBuffer`].
///
/// # Example
///
/// ```
/// use glyphdocx::buffer::{VecSink, WriteBuffer};
/// use glyphdocx::archive::ZipWriter;
///
/// let mut buffer = WriteBuffer::open(VecSink::new());
/// let mut zip = ZipWriter::open(&mut buffer);
/// zip.write_file(b"hello world\n", "hello/hw.txt")?;
/// zip.close()?;
/// buffer.close()?;
/// assert_eq!(&buffer.get_ref().as_bytes()[..4], b"PK\x03\x04");
/// # Ok::<(), glyphdocx::Error>(())
/// ```
pub struct ZipWriter<'a, S: Sink> {
    buffer: &'a mut WriteBuffer<S>,
    entries: Vec<CentralEntry>,
    poison: Option<Poison>,
}

impl<'a, S: Sink> ZipWriter<'a, S> {
    /// Starts an archive at the buffer's current position.
    pub fn open(buffer: &'a mut WriteBuffer<S>) -> Self {
        Self {
            buffer,
            entries: Vec::new(),
            poison: None,
        }
    }

    /// Writes one stored entry named `name` containing `data`.
    pub fn write_file(&mut self, data: &[u8], name: &str) -> Result<()> {
        self.check()?;

        let name_len = u16::try_from(name.len())
            .map_err(|_| Error::Zip(format!("entry name too long: {} bytes", name.len())))?;
        let size = u32::try_from(data.len())
            .map_err(|_| Error::Zip(format!("entry '{}' exceeds 4 GiB", name)))?;
        let offset = u32::try_from(self.buffer.position())
            .map_err(|_| Error::Zip("archive exceeds 4 GiB".to_string()))?;
        if self.entries.len() >= usize::from(u16::MAX) {
            return Err(Error::Zip("too many entries".to_string()));
        }

        let mut crc = Crc::new();
        crc.update(data);
        let entry = CentralEntry {
            name: name.to_string(),
            crc: crc.sum(),
            size,
            offset,
        };
        self.entries.try_reserve(1)?;

        let mut header = Vec::with_capacity(30 + name.len());
        put_u32(&mut header, LOCAL_HEADER_SIG);
        put_u16(&mut header, VERSION);
        put_u16(&mut header, name_flags(name));
        put_u16(&mut header, METHOD_STORE);
        put_u16(&mut header, DOS_TIME);
        put_u16(&mut header, DOS_DATE);
        put_u32(&mut header, entry.crc);
        put_u32(&mut header, entry.size); // compressed
        put_u32(&mut header, entry.size); // uncompressed
        put_u16(&mut header, name_len);
        put_u16(&mut header, 0); // extra field length
        header.extend_from_slice(name.as_bytes());

        self.emit(&header)?;
        self.emit(data)?;
        log::trace!("zip entry '{}' ({} bytes) at offset {}", name, size, offset);
        self.entries.push(entry);
        Ok(())
    }

    /// Number of entries written so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries have been written.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw access to the underlying buffer, e.g. for padding between entries.
    /// Central directory offsets stay correct because each entry records the
    /// buffer position at the time it was written.
    pub fn buffer_mut(&mut self) -> &mut WriteBuffer<S> {
        self.buffer
    }

    /// Writes the central directory and end-of-central-directory record.
    pub fn close(mut self) -> Result<()> {
        self.check()?;

        let cd_offset = u32::try_from(self.buffer.position())
            .map_err(|_| Error::Zip("archive exceeds 4 GiB".to_string()))?;
        let entries = std::mem::take(&mut self.entries);

        let mut directory = Vec::new();
        for entry in &entries {
            put_u32(&mut directory, CENTRAL_HEADER_SIG);
            put_u16(&mut directory, VERSION); // made by
            put_u16(&mut directory, VERSION); // needed to extract
            put_u16(&mut directory, name_flags(&entry.name));
            put_u16(&mut directory, METHOD_STORE);
            put_u16(&mut directory, DOS_TIME);
            put_u16(&mut directory, DOS_DATE);
            put_u32(&mut directory, entry.crc);
            put_u32(&mut directory, entry.size);
            put_u32(&mut directory, entry.size);
            put_u16(&mut directory, entry.name.len() as u16);
            put_u16(&mut directory, 0); // extra field length
            put_u16(&mut directory, 0); // comment length
            put_u16(&mut directory, 0); // disk number
            put_u16(&mut directory, 0); // internal attributes
            put_u32(&mut directory, 0); // external attributes
            put_u32(&mut directory, entry.offset);
            directory.extend_from_slice(entry.name.as_bytes());
        }
        let cd_size = u32::try_from(directory.len())
            .map_err(|_| Error::Zip("central directory exceeds 4 GiB".to_string()))?;

        // Checked in write_file.
        let count = entries.len() as u16;
        put_u32(&mut directory, END_OF_CENTRAL_DIR_SIG);
        put_u16(&mut directory, 0); // this disk
        put_u16(&mut directory, 0); // disk with central directory
        put_u16(&mut directory, count);
        put_u16(&mut directory, count);
        put_u32(&mut directory, cd_size);
        put_u32(&mut directory, cd_offset);
        put_u16(&mut directory, ARCHIVE_COMMENT.len() as u16);
        directory.extend_from_slice(ARCHIVE_COMMENT);

        self.emit(&directory)?;
        log::debug!(
            "zip closed: {} entries, central directory {} bytes at {}",
            count,
            cd_size,
            cd_offset
        );
        Ok(())
    }

    fn check(&self) -> Result<()> {
        match &self.poison {
            Some(poison) => Err(poison.to_error()),
            None => Ok(()),
        }
    }

    fn emit(&mut self, bytes: &[u8]) -> Result<()> {
        match self.buffer.write_all(bytes) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.poison = match &err {
                    Error::Io(e) => Some(Poison::Io(e.kind(), e.to_string())),
                    other => Some(Poison::Eof(other.to_string())),
                };
                Err(err)
            }
        }
    }
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}
