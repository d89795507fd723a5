//! Directory record handling

use serde::Serialize;

use crate::error::{CcfsError, Result};
use crate::layout::{ENTRY_SIZE, LAST_SLOT, ROOT_BLOCK};

/// Record attributes
pub mod attrs {
    pub const DIRECTORY: u8 = 0x08;
}

/// Name field width
pub const NAME_LEN: usize = 0x15;

const NAME_OFFSET: usize = 0x00;
const ATTR_OFFSET: usize = 0x15;
const TIME_OFFSET: usize = 0x16;
const DATE_OFFSET: usize = 0x18;
const BLOCK_OFFSET: usize = 0x1A;
const SIZE_OFFSET: usize = 0x1C;

/// Location of a record: pool block and slot within it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryPos {
    pub block: u16,
    pub slot: u8,
}

impl EntryPos {
    /// First record of the root directory
    pub const ROOT: EntryPos = EntryPos { block: ROOT_BLOCK, slot: 0 };

    pub fn new(block: u16, slot: u8) -> Self {
        debug_assert!(slot <= LAST_SLOT);
        Self { block, slot }
    }

    /// First record of a chain starting at `block`
    pub fn first_in(block: u16) -> Self {
        Self { block, slot: 0 }
    }

    /// Last slot of its block; the next record lives in the successor block
    pub fn is_last_in_block(&self) -> bool {
        self.slot == LAST_SLOT
    }
}

/// Directory record (32 bytes)
///
/// A snapshot of the record at `pos`. Setters only touch this copy; write it
/// back through the volume to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pos: EntryPos,
    name: [u8; NAME_LEN],
    attributes: u8,
    time: u16,
    date: u16,
    first_block: u16,
    size: u32,
}

impl DirEntry {
    /// All-zero record at `pos`
    pub fn empty(pos: EntryPos) -> Self {
        Self {
            pos,
            name: [0; NAME_LEN],
            attributes: 0,
            time: 0,
            date: 0,
            first_block: 0,
            size: 0,
        }
    }

    /// Parse a record read from `pos`
    pub fn parse(pos: EntryPos, data: &[u8; ENTRY_SIZE]) -> Self {
        let mut name = [0u8; NAME_LEN];
        name.copy_from_slice(&data[NAME_OFFSET..NAME_OFFSET + NAME_LEN]);

        Self {
            pos,
            name,
            attributes: data[ATTR_OFFSET],
            time: u16::from_le_bytes([data[TIME_OFFSET], data[TIME_OFFSET + 1]]),
            date: u16::from_le_bytes([data[DATE_OFFSET], data[DATE_OFFSET + 1]]),
            first_block: u16::from_le_bytes([data[BLOCK_OFFSET], data[BLOCK_OFFSET + 1]]),
            size: u32::from_le_bytes([
                data[SIZE_OFFSET],
                data[SIZE_OFFSET + 1],
                data[SIZE_OFFSET + 2],
                data[SIZE_OFFSET + 3],
            ]),
        }
    }

    /// Encode back into the 32-byte on-disk form
    pub fn encode(&self) -> [u8; ENTRY_SIZE] {
        let mut data = [0u8; ENTRY_SIZE];
        data[NAME_OFFSET..NAME_OFFSET + NAME_LEN].copy_from_slice(&self.name);
        data[ATTR_OFFSET] = self.attributes;
        data[TIME_OFFSET..TIME_OFFSET + 2].copy_from_slice(&self.time.to_le_bytes());
        data[DATE_OFFSET..DATE_OFFSET + 2].copy_from_slice(&self.date.to_le_bytes());
        data[BLOCK_OFFSET..BLOCK_OFFSET + 2].copy_from_slice(&self.first_block.to_le_bytes());
        data[SIZE_OFFSET..SIZE_OFFSET + 4].copy_from_slice(&self.size.to_le_bytes());
        data
    }

    pub fn pos(&self) -> EntryPos {
        self.pos
    }

    /// Empty name: end of the directory's live records
    pub fn is_empty(&self) -> bool {
        self.name[0] == 0
    }

    pub fn is_directory(&self) -> bool {
        self.attributes & attrs::DIRECTORY != 0
    }

    /// Name bytes up to the first NUL
    ///
    /// A name filling all 21 bytes has no terminator.
    pub fn name_bytes(&self) -> &[u8] {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
        &self.name[..end]
    }

    pub fn name(&self) -> String {
        String::from_utf8_lossy(self.name_bytes()).into_owned()
    }

    /// Check if the record carries exactly this name
    pub fn matches_name(&self, name: &str) -> bool {
        self.name_bytes() == name.as_bytes()
    }

    pub fn attributes(&self) -> u8 {
        self.attributes
    }

    pub fn time(&self) -> u16 {
        self.time
    }

    pub fn date(&self) -> u16 {
        self.date
    }

    /// First block of a directory's own record chain
    ///
    /// Only meaningful when [`DirEntry::is_directory`] holds.
    pub fn first_block(&self) -> u16 {
        self.first_block
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Replace the name, clearing the rest of the field
    ///
    /// Names longer than the 21-byte field are rejected, never truncated.
    /// So are names holding a NUL or a separator, which no path could reach.
    /// An empty name turns the record into a directory terminator.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        let bytes = name.as_bytes();
        if bytes.len() > NAME_LEN {
            return Err(CcfsError::NameTooLong(bytes.len()));
        }
        if name.contains(['\0', ccfs_path::SEPARATOR]) {
            return Err(CcfsError::InvalidName(name.to_string()));
        }

        self.name = [0; NAME_LEN];
        self.name[..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    pub fn set_attributes(&mut self, attributes: u8) {
        self.attributes = attributes;
    }

    pub fn set_time(&mut self, time: u16) {
        self.time = time;
    }

    pub fn set_date(&mut self, date: u16) {
        self.date = date;
    }

    pub fn set_first_block(&mut self, block: u16) {
        self.first_block = block;
    }

    pub fn set_size(&mut self, size: u32) {
        self.size = size;
    }

    /// Serializable summary
    pub fn info(&self) -> EntryInfo {
        EntryInfo {
            name: self.name(),
            kind: if self.is_directory() { EntryKind::Directory } else { EntryKind::File },
            block: self.pos.block,
            slot: self.pos.slot,
            first_block: self.first_block,
            size: self.size,
            attributes: self.attributes,
            time: self.time,
            date: self.date,
        }
    }
}

/// Record type as reported by [`EntryInfo`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// Record summary for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    pub name: String,
    pub kind: EntryKind,
    pub block: u16,
    pub slot: u8,
    pub first_block: u16,
    pub size: u32,
    pub attributes: u8,
    pub time: u16,
    pub date: u16,
}
