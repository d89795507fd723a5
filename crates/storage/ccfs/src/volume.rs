//! Volume session
//!
//! One `Volume` owns the storage handle, the parsed header and the in-memory
//! allocation table. Every record read or write goes through it.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::device::Storage;
use crate::entry::{DirEntry, EntryPos};
use crate::error::{CcfsError, Result};
use crate::header::VolumeHeader;
use crate::layout::{
    self, BLOCK_SIZE, DEFAULT_CAPACITY, ENTRY_SIZE, TABLE_ENTRY_SIZE, TABLE_OFFSET,
};
use crate::table::AllocationTable;

/// Pool blocks zeroed per write while formatting
const ZERO_CHUNK_BLOCKS: usize = 64;

/// Parameters for a new volume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// Volume name (cut to 32 bytes)
    pub label: String,
    /// Total blocks in the data pool
    pub capacity: u32,
}

impl FormatOptions {
    pub fn new(label: impl Into<String>, capacity: u32) -> Self {
        Self {
            label: label.into(),
            capacity,
        }
    }

    /// Check the options the same way formatting does
    pub fn validate(&self) -> Result<()> {
        VolumeHeader::new(&self.label, self.capacity).map(drop)
    }
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self::new("CCFS", DEFAULT_CAPACITY)
    }
}

/// Volume summary for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeInfo {
    pub label: String,
    pub capacity: u32,
    pub available: u32,
    pub first_empty: u32,
    pub free_blocks: usize,
    pub block_size: usize,
    pub pool_offset: u64,
    pub image_size: u64,
}

/// Open CCFS volume
pub struct Volume<S: Storage> {
    storage: S,
    header: VolumeHeader,
    table: AllocationTable,
}

impl<S: Storage> Volume<S> {
    /// Format `storage` as a new, empty volume
    ///
    /// Writes the header, a default allocation table and a zeroed data pool.
    pub fn create(mut storage: S, options: &FormatOptions) -> Result<Self> {
        let header = VolumeHeader::new(&options.label, options.capacity)?;
        let table = AllocationTable::new_default(header.capacity);

        storage.write_at(0, &header.encode())?;
        storage.write_at(TABLE_OFFSET, &table.encode())?;

        let pool = layout::pool_offset(header.capacity);
        let zeros = vec![0u8; BLOCK_SIZE * ZERO_CHUNK_BLOCKS];
        let mut remaining = header.capacity as usize;
        let mut offset = pool;
        while remaining > 0 {
            let blocks = remaining.min(ZERO_CHUNK_BLOCKS);
            storage.write_at(offset, &zeros[..blocks * BLOCK_SIZE])?;
            offset += (blocks * BLOCK_SIZE) as u64;
            remaining -= blocks;
        }
        storage.flush()?;

        info!(
            label = %header.label_str(),
            capacity = header.capacity,
            "created volume"
        );

        Ok(Self {
            storage,
            header,
            table,
        })
    }

    /// Load an existing volume
    ///
    /// Fails with a format error when the magic does not match; the storage
    /// handle is dropped with the error.
    pub fn open(mut storage: S) -> Result<Self> {
        let mut block = [0u8; BLOCK_SIZE];
        read_or_truncated(&mut storage, 0, &mut block, "volume header")?;
        let header = VolumeHeader::parse(&block)?;

        let mut raw = vec![0u8; header.capacity as usize * TABLE_ENTRY_SIZE];
        read_or_truncated(&mut storage, TABLE_OFFSET, &mut raw, "allocation table")?;
        let table = AllocationTable::parse(&raw, header.capacity);

        info!(
            label = %header.label_str(),
            capacity = header.capacity,
            available = header.available,
            "opened volume"
        );

        Ok(Self {
            storage,
            header,
            table,
        })
    }

    pub fn header(&self) -> &VolumeHeader {
        &self.header
    }

    pub fn table(&self) -> &AllocationTable {
        &self.table
    }

    /// Total block count
    pub fn capacity(&self) -> u32 {
        self.header.capacity
    }

    pub fn info(&self) -> VolumeInfo {
        VolumeInfo {
            label: self.header.label_str(),
            capacity: self.header.capacity,
            available: self.header.available,
            first_empty: self.header.first_empty,
            free_blocks: self.table.free_count(),
            block_size: BLOCK_SIZE,
            pool_offset: layout::pool_offset(self.header.capacity),
            image_size: layout::image_size(self.header.capacity),
        }
    }

    /// Read the record at `pos`
    ///
    /// Positions are not range checked here; the resolver only asks for
    /// positions it derived from the chain.
    pub fn read_entry(&mut self, pos: EntryPos) -> Result<DirEntry> {
        let offset = layout::entry_offset(self.header.capacity, pos.block, pos.slot);
        let mut data = [0u8; ENTRY_SIZE];
        self.storage.read_at(offset, &mut data)?;
        Ok(DirEntry::parse(pos, &data))
    }

    /// Persist a record snapshot at its own position
    pub fn write_entry(&mut self, entry: &DirEntry) -> Result<()> {
        let pos = entry.pos();
        let offset = layout::entry_offset(self.header.capacity, pos.block, pos.slot);
        debug!(block = pos.block, slot = pos.slot, name = %entry.name(), "write record");
        self.storage.write_at(offset, &entry.encode())?;
        Ok(())
    }

    /// First record of the root directory
    pub fn root(&mut self) -> Result<DirEntry> {
        self.read_entry(EntryPos::ROOT)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.storage.flush()?;
        Ok(())
    }

    /// Close the session and hand back the storage
    pub fn into_storage(self) -> S {
        self.storage
    }
}

impl Volume<File> {
    /// Create (or truncate) a host file and format it
    pub fn create_file(path: impl AsRef<Path>, options: &FormatOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|source| CcfsError::Unavailable {
                path: path.to_path_buf(),
                source,
            })?;

        Self::create(file, options)
    }

    /// Open an existing host file without truncating it
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| CcfsError::Unavailable {
                path: path.to_path_buf(),
                source,
            })?;

        Self::open(file)
    }
}

fn read_or_truncated<S: Storage>(
    storage: &mut S,
    offset: u64,
    buffer: &mut [u8],
    what: &'static str,
) -> Result<()> {
    match storage.read_at(offset, buffer) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(CcfsError::Truncated(what)),
        Err(e) => Err(CcfsError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MemStorage;
    use crate::layout::{CCFS_FOOTER, END_OF_CHAIN, MAX_CAPACITY};

    #[test]
    fn test_create_image_layout() {
        let volume = Volume::create(MemStorage::new(), &FormatOptions::new("vol", 16)).unwrap();
        let image = volume.into_storage().into_inner();

        assert_eq!(image.len() as u64, layout::image_size(16));
        assert_eq!(&image[0..4], b"CCFS");
        assert_eq!(&image[0x1FC..0x200], CCFS_FOOTER);
        assert_eq!(&image[0x200..0x202], &END_OF_CHAIN.to_le_bytes());
        assert!(image[0x202..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_create_then_open() {
        let volume = Volume::create(MemStorage::new(), &FormatOptions::new("vol", 40)).unwrap();
        let volume = Volume::open(volume.into_storage()).unwrap();

        assert_eq!(volume.capacity(), 40);
        assert_eq!(volume.header().available, 39);
        assert_eq!(volume.header().first_empty, 1);
        assert_eq!(volume.header().label_str(), "vol");
        assert_eq!(volume.table().len(), 40);
        assert_eq!(volume.table().next(0), None);
    }

    #[test]
    fn test_create_rejects_zero_capacity() {
        let err = Volume::create(MemStorage::new(), &FormatOptions::new("vol", 0))
            .err()
            .unwrap();
        assert!(matches!(err, CcfsError::InvalidCapacity(0)));
    }

    #[test]
    fn test_validate_matches_create() {
        assert!(FormatOptions::default().validate().is_ok());
        assert!(FormatOptions::new("vol", MAX_CAPACITY).validate().is_ok());

        let too_big = FormatOptions::new("vol", MAX_CAPACITY + 1);
        assert!(matches!(too_big.validate(), Err(CcfsError::InvalidCapacity(_))));
        let err = Volume::create(MemStorage::new(), &too_big).err().unwrap();
        assert!(matches!(err, CcfsError::InvalidCapacity(c) if c == MAX_CAPACITY + 1));
    }

    #[test]
    fn test_open_short_image() {
        let err = Volume::open(MemStorage::from_vec(b"CCFS".to_vec())).err().unwrap();
        assert!(matches!(err, CcfsError::Truncated("volume header")));
        assert!(err.is_format_error());
    }

    #[test]
    fn test_info() {
        let volume = Volume::create(MemStorage::new(), &FormatOptions::new("data", 16)).unwrap();
        let info = volume.info();
        assert_eq!(info.label, "data");
        assert_eq!(info.free_blocks, 15);
        assert_eq!(info.pool_offset, 1024);
        assert_eq!(info.image_size, 1024 + 16 * 512);
    }
}
