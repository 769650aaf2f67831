//! Buffer behaviour under short transfers from the backing callbacks.

use std::io;

use glyphdocx::buffer::{ReadBuffer, Sink, Source, Status, WriteBuffer};
use proptest::prelude::*;

/// Cycles through a list of sizes, one per call.
struct Sizes {
    sizes: Vec<usize>,
    calls: usize,
}

impl Sizes {
    fn new(sizes: Vec<usize>) -> Self {
        Self { sizes, calls: 0 }
    }

    fn next(&mut self) -> usize {
        let size = self.sizes[self.calls % self.sizes.len()];
        self.calls += 1;
        size
    }
}

/// Source that returns at most `limits[i]` bytes on its i-th read and hands
/// out cache windows cycling through `windows`.
struct ShortSource {
    data: Vec<u8>,
    pos: usize,
    limits: Vec<usize>,
    calls: usize,
    windows: Option<Sizes>,
}

impl ShortSource {
    fn new(data: Vec<u8>, limits: Vec<usize>, windows: Option<Vec<usize>>) -> Self {
        Self {
            data,
            pos: 0,
            limits,
            calls: 0,
            windows: windows.map(Sizes::new),
        }
    }

    fn next_limit(&mut self) -> usize {
        let limit = self.limits[self.calls % self.limits.len()];
        self.calls += 1;
        limit
    }
}

impl Source for ShortSource {
    fn read(&mut self, dest: &mut [u8]) -> io::Result<usize> {
        let n = self
            .next_limit()
            .min(dest.len())
            .min(self.data.len() - self.pos);
        dest[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn has_cache(&self) -> bool {
        self.windows.is_some()
    }

    fn fill_cache(&mut self, cache: &mut Vec<u8>) -> io::Result<()> {
        let window = self.windows.as_mut().map_or(0, Sizes::next);
        let n = window.min(self.data.len() - self.pos);
        cache.clear();
        cache.extend_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(())
    }
}

/// Sink that accepts at most `limits[i]` bytes on its i-th write and at
/// most `capacity` bytes in total, with cache windows cycling through
/// `windows`.
struct ShortSink {
    data: Vec<u8>,
    capacity: usize,
    limits: Vec<usize>,
    calls: usize,
    windows: Option<Sizes>,
}

impl ShortSink {
    fn new(capacity: usize, limits: Vec<usize>, windows: Option<Vec<usize>>) -> Self {
        Self {
            data: Vec::new(),
            capacity,
            limits,
            calls: 0,
            windows: windows.map(Sizes::new),
        }
    }
}

impl Sink for ShortSink {
    fn write(&mut self, src: &[u8]) -> io::Result<usize> {
        let limit = self.limits[self.calls % self.limits.len()];
        self.calls += 1;
        let n = limit
            .min(src.len())
            .min(self.capacity - self.data.len());
        self.data.extend_from_slice(&src[..n]);
        Ok(n)
    }

    fn has_cache(&self) -> bool {
        self.windows.is_some()
    }

    fn cache_size(&mut self) -> io::Result<usize> {
        if self.data.len() >= self.capacity {
            return Ok(0);
        }
        Ok(self.windows.as_mut().map_or(0, Sizes::next))
    }
}

fn read_everything(buffer: &mut ReadBuffer<ShortSource>, requests: &[usize]) -> Vec<u8> {
    let mut out = Vec::new();
    for i in 0.. {
        let mut chunk = vec![0u8; requests[i % requests.len()]];
        let transfer = buffer.read(&mut chunk).unwrap();
        out.extend_from_slice(&chunk[..transfer.actual]);
        assert_eq!(buffer.position(), out.len() as u64);
        if transfer.is_eof() {
            break;
        }
    }
    out
}

fn cache_windows() -> impl Strategy<Value = Option<Vec<usize>>> {
    proptest::option::of(proptest::collection::vec(1usize..=200, 1..8))
}

proptest! {
    #[test]
    fn read_delivers_every_byte_in_order(
        data in proptest::collection::vec(any::<u8>(), 0..2000),
        limits in proptest::collection::vec(1usize..=91, 1..16),
        requests in proptest::collection::vec(1usize..300, 1..16),
        windows in cache_windows(),
    ) {
        let mut buffer = ReadBuffer::open(ShortSource::new(data.clone(), limits, windows));
        let out = read_everything(&mut buffer, &requests);
        prop_assert_eq!(&out, &data);

        let mut more = [0u8; 8];
        let transfer = buffer.read(&mut more).unwrap();
        prop_assert_eq!(transfer.actual, 0);
        prop_assert_eq!(transfer.status, Status::Eof);
        prop_assert_eq!(buffer.close().unwrap(), Status::Ok);
    }

    #[test]
    fn write_delivers_every_byte_in_order(
        data in proptest::collection::vec(any::<u8>(), 0..2000),
        limits in proptest::collection::vec(1usize..=61, 1..16),
        requests in proptest::collection::vec(1usize..300, 1..16),
        windows in cache_windows(),
    ) {
        let mut buffer = WriteBuffer::open(ShortSink::new(usize::MAX, limits, windows));
        let mut pos = 0;
        let mut i = 0;
        while pos < data.len() {
            let end = (pos + requests[i % requests.len()]).min(data.len());
            let transfer = buffer.write(&data[pos..end]).unwrap();
            prop_assert_eq!(transfer.status, Status::Ok);
            pos = end;
            i += 1;
            prop_assert_eq!(buffer.position(), pos as u64);
        }
        prop_assert_eq!(buffer.close().unwrap(), Status::Ok);
        prop_assert_eq!(&buffer.get_ref().data, &data);
    }

    #[test]
    fn full_sink_is_reported(
        data in proptest::collection::vec(any::<u8>(), 1..2000),
        capacity_share in 0.0f64..1.0,
        limits in proptest::collection::vec(1usize..=61, 1..16),
        requests in proptest::collection::vec(1usize..300, 1..16),
        windows in cache_windows(),
    ) {
        let capacity = (data.len() as f64 * capacity_share) as usize;
        let mut buffer = WriteBuffer::open(ShortSink::new(capacity, limits, windows));
        let mut pos = 0;
        let mut i = 0;
        let mut saw_eof = false;
        while pos < data.len() {
            let end = (pos + requests[i % requests.len()]).min(data.len());
            if buffer.write(&data[pos..end]).unwrap().is_eof() {
                saw_eof = true;
                break;
            }
            pos = end;
            i += 1;
        }
        if buffer.close().unwrap() == Status::Eof {
            saw_eof = true;
        }
        prop_assert!(saw_eof);

        let written = &buffer.get_ref().data;
        prop_assert!(written.len() <= capacity);
        prop_assert_eq!(&written[..], &data[..written.len()]);
    }
}

#[test]
fn closed_buffers_refuse_transfers() {
    let mut reader = ReadBuffer::open(ShortSource::new(b"abc".to_vec(), vec![1], None));
    reader.close().unwrap();
    assert!(reader.read(&mut [0u8; 1]).is_err());

    let mut writer = WriteBuffer::open(ShortSink::new(16, vec![3], Some(vec![2, 5])));
    writer.write_all(b"abc").unwrap();
    assert_eq!(writer.close().unwrap(), Status::Ok);
    assert_eq!(writer.close().unwrap(), Status::Ok);
    assert!(writer.write(b"d").is_err());
    assert_eq!(writer.get_ref().data, b"abc");
}
