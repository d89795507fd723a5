//! Storage handle
//!
//! A volume reads and writes its image through this trait at explicit byte
//! offsets. Host files and in-memory images both implement it.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Byte-addressable, seekable backing store for one volume
pub trait Storage {
    /// Fill `buffer` from `offset`
    ///
    /// # Arguments
    /// * `offset` - Absolute byte offset in the image
    /// * `buffer` - Buffer to read into (size determines byte count)
    fn read_at(&mut self, offset: u64, buffer: &mut [u8]) -> io::Result<()>;

    /// Write all of `buffer` at `offset`
    fn write_at(&mut self, offset: u64, buffer: &[u8]) -> io::Result<()>;

    /// Flush any cached writes
    fn flush(&mut self) -> io::Result<()> {
        Ok(()) // Default: no caching
    }
}

impl Storage for File {
    fn read_at(&mut self, offset: u64, buffer: &mut [u8]) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.read_exact(buffer)
    }

    fn write_at(&mut self, offset: u64, buffer: &[u8]) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.write_all(buffer)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

impl<T: Storage + ?Sized> Storage for &mut T {
    fn read_at(&mut self, offset: u64, buffer: &mut [u8]) -> io::Result<()> {
        (**self).read_at(offset, buffer)
    }

    fn write_at(&mut self, offset: u64, buffer: &[u8]) -> io::Result<()> {
        (**self).write_at(offset, buffer)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// In-memory image, grown on demand by writes
#[derive(Debug, Clone, Default)]
pub struct MemStorage {
    data: Vec<u8>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing image
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Storage for MemStorage {
    fn read_at(&mut self, offset: u64, buffer: &mut [u8]) -> io::Result<()> {
        let start = usize::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset out of range"))?;
        let end = start
            .checked_add(buffer.len())
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "read past end of image"))?;

        buffer.copy_from_slice(&self.data[start..end]);
        Ok(())
    }

    fn write_at(&mut self, offset: u64, buffer: &[u8]) -> io::Result<()> {
        let start = usize::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset out of range"))?;
        let end = start + buffer.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }

        self.data[start..end].copy_from_slice(buffer);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mem_storage_grows_on_write() {
        let mut storage = MemStorage::new();
        storage.write_at(4, b"abcd").unwrap();
        assert_eq!(storage.as_bytes(), b"\0\0\0\0abcd");

        let mut buf = [0u8; 2];
        storage.read_at(5, &mut buf).unwrap();
        assert_eq!(&buf, b"bc");
    }

    #[test]
    fn test_mem_storage_short_read() {
        let mut storage = MemStorage::from_vec(vec![0; 8]);
        let mut buf = [0u8; 4];
        let err = storage.read_at(6, &mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
