#[cfg(test)]
mod file_tests;

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use memmap2::{MmapMut, MmapOptions};

use crate::store::BackingStore;

/// FileStore serves a pre-allocated disk image through a mutable memory
/// map. The map is dropped and rebuilt whenever the image is resized.
pub struct FileStore {
    path: PathBuf,
    file: File,
    map: Option<MmapMut>,
    len: u64,
    pos: u64,
}

impl FileStore {
    /// `create` opens (or creates) the image at `path` and pre-sizes it to
    /// `len` bytes. New bytes read as zero.
    ///
    /// # Errors
    /// Returns an error if the image cannot be created, sized, or mapped.
    pub fn create(path: impl AsRef<Path>, len: u64) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        file.set_len(len)?;
        let map = Self::map_file(&file, len)?;

        Ok(Self {
            path,
            file,
            map,
            len,
            pos: 0,
        })
    }

    /// `open` maps an existing image at its current size.
    ///
    /// # Errors
    /// Returns an error if the image cannot be opened or mapped.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        let len = file.metadata()?.len();
        let map = Self::map_file(&file, len)?;

        Ok(Self {
            path,
            file,
            map,
            len,
            pos: 0,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn map_file(file: &File, len: u64) -> io::Result<Option<MmapMut>> {
        if len == 0 {
            return Ok(None);
        }
        let map_len = usize::try_from(len)
            .map_err(|_| io::Error::other(format!("image length {len} exceeds addressable size")))?;
        let map = unsafe { MmapOptions::new().len(map_len).map_mut(file)? };
        Ok(Some(map))
    }
}

impl BackingStore for FileStore {
    fn len(&self) -> u64 {
        self.len
    }

    fn set_len(&mut self, len: u64) -> io::Result<()> {
        if len == self.len {
            return Ok(());
        }
        // The old map must go before the file changes size under it.
        self.map.take();
        self.file.set_len(len)?;
        self.map = Self::map_file(&self.file, len)?;
        self.len = len;
        Ok(())
    }

    fn seek(&mut self, pos: u64) -> io::Result<()> {
        self.pos = pos;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(map) = self.map.as_ref() else {
            return Ok(0);
        };
        let Ok(off) = usize::try_from(self.pos) else {
            return Ok(0);
        };
        if off >= map.len() {
            return Ok(0);
        }
        let n = buf.len().min(map.len() - off);
        buf[..n].copy_from_slice(&map[off..off + n]);
        self.pos += n as u64;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let Some(map) = self.map.as_mut() else {
            return Ok(0);
        };
        let Ok(off) = usize::try_from(self.pos) else {
            return Ok(0);
        };
        if off >= map.len() {
            return Ok(0);
        }
        let n = buf.len().min(map.len() - off);
        map[off..off + n].copy_from_slice(&buf[..n]);
        self.pos += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(map) = self.map.as_ref() {
            map.flush()?;
        }
        Ok(())
    }
}
