//! CCFS on-disk layout
//!
//! Every offset the format uses is derived here and nowhere else.

// ============================================================================
// CONSTANTS
// ============================================================================

/// Block size, shared by the header block and every data pool block
pub const BLOCK_SIZE: usize = 512;

/// Directory record size
pub const ENTRY_SIZE: usize = 32;

/// Records per data pool block
pub const ENTRIES_PER_BLOCK: usize = BLOCK_SIZE / ENTRY_SIZE;

/// Slot number of the last record in a block
pub const LAST_SLOT: u8 = (ENTRIES_PER_BLOCK - 1) as u8;

/// Header magic at offset 0x00
pub const CCFS_MAGIC: &[u8; 4] = b"CCFS";

/// Footer magic at offset 0x1FC
pub const CCFS_FOOTER: &[u8; 4] = b"SFCC";

/// Byte offset of the allocation table
pub const TABLE_OFFSET: u64 = BLOCK_SIZE as u64;

/// Bytes per allocation table entry
pub const TABLE_ENTRY_SIZE: usize = 2;

/// Allocation table value: last block of a chain
pub const END_OF_CHAIN: u16 = 0xFFFF;

/// Allocation table value: unallocated block
pub const FREE_BLOCK: u16 = 0x0000;

/// Pool block holding the root directory
pub const ROOT_BLOCK: u16 = 0;

/// Default volume capacity in blocks
pub const DEFAULT_CAPACITY: u32 = 65536;

/// Largest capacity addressable by 16-bit block pointers
pub const MAX_CAPACITY: u32 = 0x1_0000;

// ============================================================================
// OFFSETS
// ============================================================================

/// Size of the allocation table, rounded up to whole blocks
pub fn table_len(capacity: u32) -> u64 {
    let raw = capacity as u64 * TABLE_ENTRY_SIZE as u64;
    raw.div_ceil(BLOCK_SIZE as u64) * BLOCK_SIZE as u64
}

/// Byte offset of pool block 0
pub fn pool_offset(capacity: u32) -> u64 {
    TABLE_OFFSET + table_len(capacity)
}

/// Byte offset of a record inside the data pool
///
/// No range check: callers only pass positions derived from the chain.
pub fn entry_offset(capacity: u32, block: u16, slot: u8) -> u64 {
    pool_offset(capacity) + block as u64 * BLOCK_SIZE as u64 + slot as u64 * ENTRY_SIZE as u64
}

/// Total size of a freshly created image
pub fn image_size(capacity: u32) -> u64 {
    pool_offset(capacity) + capacity as u64 * BLOCK_SIZE as u64
}
