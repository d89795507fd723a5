//! Allocation table operations

use crate::layout::{table_len, END_OF_CHAIN, FREE_BLOCK, ROOT_BLOCK, TABLE_ENTRY_SIZE};

/// Decoded allocation table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    /// Last block of its chain
    End,
    /// Unallocated block
    Free,
    /// Chain continues at this block
    Next(u16),
}

impl Link {
    pub fn from_raw(value: u16) -> Self {
        match value {
            END_OF_CHAIN => Link::End,
            FREE_BLOCK => Link::Free,
            next => Link::Next(next),
        }
    }
}

/// In-memory mirror of the on-disk allocation table
///
/// Loaded once when a volume is opened and never partially invalidated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationTable {
    entries: Vec<u16>,
}

impl AllocationTable {
    /// Fresh table: root is a single-block chain, everything else is free
    pub fn new_default(block_count: u32) -> Self {
        let mut entries = vec![FREE_BLOCK; block_count as usize];
        if let Some(root) = entries.get_mut(ROOT_BLOCK as usize) {
            *root = END_OF_CHAIN;
        }
        Self { entries }
    }

    /// Parse `block_count` little-endian entries
    pub fn parse(data: &[u8], block_count: u32) -> Self {
        let entries = data
            .chunks_exact(TABLE_ENTRY_SIZE)
            .take(block_count as usize)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self { entries }
    }

    /// Encode, zero-padded to whole blocks
    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(table_len(self.entries.len() as u32) as usize);
        for entry in &self.entries {
            data.extend_from_slice(&entry.to_le_bytes());
        }
        data.resize(table_len(self.entries.len() as u32) as usize, 0);
        data
    }

    /// Number of blocks covered
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored value for a block
    ///
    /// # Panics
    /// If `block` is outside the table.
    pub fn raw(&self, block: u16) -> u16 {
        self.entries[block as usize]
    }

    /// Successor of `block` in its chain
    ///
    /// `None` only for the end-of-chain marker. A free entry comes back as
    /// `Some(0)`; use [`AllocationTable::link`] to tell the two apart.
    ///
    /// # Panics
    /// If `block` is outside the table.
    pub fn next(&self, block: u16) -> Option<u16> {
        match self.raw(block) {
            END_OF_CHAIN => None,
            value => Some(value),
        }
    }

    /// Decoded entry for `block`, `None` if out of range
    pub fn link(&self, block: u16) -> Option<Link> {
        self.entries.get(block as usize).copied().map(Link::from_raw)
    }

    /// Check if a block index is covered by the table
    pub fn contains(&self, block: u16) -> bool {
        (block as usize) < self.entries.len()
    }

    /// Count of entries marked free
    pub fn free_count(&self) -> usize {
        self.entries.iter().filter(|&&e| e == FREE_BLOCK).count()
    }

    /// Test fixtures need chains the allocator would have built
    #[cfg(test)]
    pub(crate) fn set(&mut self, block: u16, value: u16) {
        self.entries[block as usize] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let table = AllocationTable::new_default(8);
        assert_eq!(table.len(), 8);
        assert_eq!(table.next(0), None);
        for block in 1..8 {
            // free entries read back as a link to block 0
            assert_eq!(table.next(block), Some(0));
            assert_eq!(table.link(block), Some(Link::Free));
        }
        assert_eq!(table.link(0), Some(Link::End));
        assert_eq!(table.free_count(), 7);
    }

    #[test]
    fn test_encode_parse() {
        let mut table = AllocationTable::new_default(300);
        table.set(0, 7);
        table.set(7, END_OF_CHAIN);

        let data = table.encode();
        assert_eq!(data.len(), 1024);
        assert_eq!(&data[0..2], &[7, 0]);
        assert_eq!(&data[14..16], &[0xFF, 0xFF]);

        assert_eq!(AllocationTable::parse(&data, 300), table);
    }

    #[test]
    fn test_link_out_of_range() {
        let table = AllocationTable::new_default(4);
        assert_eq!(table.link(4), None);
        assert!(!table.contains(4));
        assert!(table.contains(3));
    }

    #[test]
    #[should_panic]
    fn test_next_out_of_range_panics() {
        let table = AllocationTable::new_default(4);
        let _ = table.next(4);
    }
}
