//! Heap-backed store, the default harness for exercising an array.

use std::io;

use crate::store::BackingStore;

/// MemStore keeps its bytes in a `Vec` behind a cursor.
///
/// Writes never grow the buffer on their own; `set_len` provisions
/// capacity, and a write reaching the end reports a short count.
pub struct MemStore {
    data: Vec<u8>,
    pos: u64,
}

impl MemStore {
    /// `new` returns a zero-filled store of `len` bytes.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            data: vec![0u8; len],
            pos: 0,
        }
    }

    /// `from_vec` wraps existing bytes without copying.
    #[must_use]
    pub const fn from_vec(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }
}

impl BackingStore for MemStore {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn set_len(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len)
            .map_err(|_| io::Error::other(format!("store length {len} exceeds addressable size")))?;
        self.data.resize(len, 0);
        Ok(())
    }

    fn seek(&mut self, pos: u64) -> io::Result<()> {
        self.pos = pos;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Ok(off) = usize::try_from(self.pos) else {
            return Ok(0);
        };
        if off >= self.data.len() {
            return Ok(0);
        }
        let n = buf.len().min(self.data.len() - off);
        buf[..n].copy_from_slice(&self.data[off..off + n]);
        self.pos += n as u64;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let Ok(off) = usize::try_from(self.pos) else {
            return Ok(0);
        };
        if off >= self.data.len() {
            return Ok(0);
        }
        let n = buf.len().min(self.data.len() - off);
        self.data[off..off + n].copy_from_slice(&buf[..n]);
        self.pos += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_store_reads_as_zero() {
        let mut s = MemStore::new(64);
        assert_eq!(s.len(), 64);
        let mut buf = [0xAAu8; 64];
        assert_eq!(s.read(&mut buf).unwrap(), 64);
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn write_then_read_roundtrip() {
        let mut s = MemStore::new(32);
        s.seek(8).unwrap();
        assert_eq!(s.write(b"abcd").unwrap(), 4);
        s.seek(8).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(s.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
    }

    #[test]
    fn reads_and_writes_stop_at_the_end() {
        let mut s = MemStore::new(10);
        s.seek(8).unwrap();
        assert_eq!(s.write(b"xxxx").unwrap(), 2);
        assert_eq!(s.write(b"xxxx").unwrap(), 0);

        s.seek(8).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(s.read(&mut buf).unwrap(), 2);
        assert_eq!(s.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn set_len_grows_zero_filled() {
        let mut s = MemStore::from_vec(vec![0xFF; 4]);
        s.set_len(8).unwrap();
        assert_eq!(s.len(), 8);
        let mut buf = [0u8; 8];
        s.seek(0).unwrap();
        assert_eq!(s.read(&mut buf).unwrap(), 8);
        assert_eq!(&buf[..4], &[0xFF; 4]);
        assert_eq!(&buf[4..], &[0; 4]);
    }

    #[test]
    fn seek_past_end_reads_nothing() {
        let mut s = MemStore::new(4);
        s.seek(100).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(s.read(&mut buf).unwrap(), 0);
    }
}
