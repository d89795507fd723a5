//! Volume header (block 0)

use crate::error::{CcfsError, Result};
use crate::layout::{BLOCK_SIZE, CCFS_FOOTER, CCFS_MAGIC, MAX_CAPACITY};

/// Label field width
pub const LABEL_LEN: usize = 0x20;

const MAGIC_OFFSET: usize = 0x00;
const LABEL_OFFSET: usize = 0x04;
const CAPACITY_OFFSET: usize = 0x24;
const AVAILABLE_OFFSET: usize = 0x28;
const FIRST_EMPTY_OFFSET: usize = 0x2C;
const FOOTER_OFFSET: usize = 0x1FC;

/// Volume header
///
/// `available` and `first_empty` are written once by [`VolumeHeader::new`]
/// and carried unchanged afterwards; nothing in this crate allocates blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeHeader {
    /// Volume name, NUL-padded
    pub label: [u8; LABEL_LEN],
    /// Total block count
    pub capacity: u32,
    /// Free block count
    pub available: u32,
    /// Index of the first free block
    pub first_empty: u32,
}

impl VolumeHeader {
    /// Header for a new volume
    ///
    /// The root directory takes block 0, so one block is already used.
    /// Labels longer than 32 bytes are cut to fit the field.
    pub fn new(label: &str, capacity: u32) -> Result<Self> {
        if capacity == 0 || capacity > MAX_CAPACITY {
            return Err(CcfsError::InvalidCapacity(capacity));
        }

        let mut field = [0u8; LABEL_LEN];
        let bytes = label.as_bytes();
        let len = bytes.len().min(LABEL_LEN);
        field[..len].copy_from_slice(&bytes[..len]);

        Ok(Self {
            label: field,
            capacity,
            available: capacity - 1,
            first_empty: 1,
        })
    }

    /// Parse header from block 0
    ///
    /// Only the leading magic is checked. The footer is left unverified.
    pub fn parse(block: &[u8; BLOCK_SIZE]) -> Result<Self> {
        let magic: [u8; 4] = read_array(block, MAGIC_OFFSET);
        if &magic != CCFS_MAGIC {
            return Err(CcfsError::BadMagic(magic));
        }

        let capacity = u32::from_le_bytes(read_array(block, CAPACITY_OFFSET));
        if capacity == 0 || capacity > MAX_CAPACITY {
            return Err(CcfsError::InvalidCapacity(capacity));
        }

        Ok(Self {
            label: read_array(block, LABEL_OFFSET),
            capacity,
            available: u32::from_le_bytes(read_array(block, AVAILABLE_OFFSET)),
            first_empty: u32::from_le_bytes(read_array(block, FIRST_EMPTY_OFFSET)),
        })
    }

    /// Encode into a full zero-padded block
    pub fn encode(&self) -> [u8; BLOCK_SIZE] {
        let mut block = [0u8; BLOCK_SIZE];
        block[MAGIC_OFFSET..MAGIC_OFFSET + 4].copy_from_slice(CCFS_MAGIC);
        block[LABEL_OFFSET..LABEL_OFFSET + LABEL_LEN].copy_from_slice(&self.label);
        block[CAPACITY_OFFSET..CAPACITY_OFFSET + 4].copy_from_slice(&self.capacity.to_le_bytes());
        block[AVAILABLE_OFFSET..AVAILABLE_OFFSET + 4].copy_from_slice(&self.available.to_le_bytes());
        block[FIRST_EMPTY_OFFSET..FIRST_EMPTY_OFFSET + 4]
            .copy_from_slice(&self.first_empty.to_le_bytes());
        block[FOOTER_OFFSET..FOOTER_OFFSET + 4].copy_from_slice(CCFS_FOOTER);
        block
    }

    /// Label as text, NUL padding stripped
    pub fn label_str(&self) -> String {
        let end = self.label.iter().position(|&b| b == 0).unwrap_or(LABEL_LEN);
        String::from_utf8_lossy(&self.label[..end]).into_owned()
    }
}

fn read_array<const N: usize>(block: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&block[offset..offset + N]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_new() {
        let header = VolumeHeader::new("disk.ccfs", 64).unwrap();
        assert_eq!(header.capacity, 64);
        assert_eq!(header.available, 63);
        assert_eq!(header.first_empty, 1);
        assert_eq!(header.label_str(), "disk.ccfs");
    }

    #[test]
    fn test_header_byte_layout() {
        let block = VolumeHeader::new("vol", 16).unwrap().encode();
        assert_eq!(&block[0x00..0x04], b"CCFS");
        assert_eq!(&block[0x04..0x07], b"vol");
        assert!(block[0x07..0x24].iter().all(|&b| b == 0));
        assert_eq!(&block[0x24..0x28], &16u32.to_le_bytes());
        assert_eq!(&block[0x28..0x2C], &15u32.to_le_bytes());
        assert_eq!(&block[0x2C..0x30], &1u32.to_le_bytes());
        assert_eq!(&block[0x1FC..0x200], b"SFCC");
    }

    #[test]
    fn test_header_parse() {
        let header = VolumeHeader::new("vol", 16).unwrap();
        assert_eq!(VolumeHeader::parse(&header.encode()).unwrap(), header);
    }

    #[test]
    fn test_header_bad_magic() {
        let mut block = VolumeHeader::new("vol", 16).unwrap().encode();
        block[0..4].copy_from_slice(b"FAT1");
        assert!(matches!(
            VolumeHeader::parse(&block),
            Err(CcfsError::BadMagic(m)) if &m == b"FAT1"
        ));
    }

    #[test]
    fn test_header_footer_not_checked() {
        let mut block = VolumeHeader::new("vol", 16).unwrap().encode();
        block[0x1FC..0x200].copy_from_slice(&[0; 4]);
        assert!(VolumeHeader::parse(&block).is_ok());
    }

    #[test]
    fn test_header_capacity_limits() {
        assert!(matches!(VolumeHeader::new("v", 0), Err(CcfsError::InvalidCapacity(0))));
        assert!(VolumeHeader::new("v", MAX_CAPACITY).is_ok());
        assert!(VolumeHeader::new("v", MAX_CAPACITY + 1).is_err());
    }

    #[test]
    fn test_header_long_label_truncated() {
        let long = "a".repeat(40);
        let header = VolumeHeader::new(&long, 8).unwrap();
        assert_eq!(header.label_str(), "a".repeat(LABEL_LEN));
        assert_eq!(header.capacity, 8);
    }
}
