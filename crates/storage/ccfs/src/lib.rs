//! CCFS - single-file container filesystem
//!
//! A CCFS volume emulates a block filesystem inside one host file. Directories
//! are chains of 512-byte blocks linked through a 16-bit allocation table,
//! each block holding sixteen 32-byte records.
//!
//! ## Disk Layout
//!
//! ```text
//! 0x000            Volume header (512 bytes)
//!                    "CCFS" | label | capacity | available | firstEmpty
//!                    ... "SFCC" at 0x1FC
//! 0x200            Allocation table, one u16 per block
//!                    0xFFFF end of chain | 0x0000 free | n next block
//! pool_offset      Data pool, `capacity` blocks
//!                    block 0 = root directory, 16 records per block
//! ```
//!
//! The data pool starts at the first block boundary after the table, so
//! with the default 65536 blocks the table fills blocks 1..=256 and the pool
//! begins at block 257.
//!
//! ## Lookups
//!
//! Every lookup starts at the root record (pool block 0, slot 0) and walks
//! one directory at a time: scan records until the name matches or an empty
//! record ends the directory, crossing to the next block of the chain after
//! slot 15, then descend into the matched directory's own chain.
//!
//! ```no_run
//! use ccfs_common::{FormatOptions, Volume};
//!
//! # fn main() -> ccfs_common::Result<()> {
//! let mut volume = Volume::create_file("disk.ccfs", &FormatOptions::new("disk", 1024))?;
//! match volume.resolve("/docs/readme")? {
//!     Some(entry) => println!("{} bytes", entry.size()),
//!     None => println!("not found"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Block allocation, freeing and file content I/O are not provided: records
//! are read, changed in memory and written back in place.

pub mod device;
pub mod entry;
pub mod error;
pub mod header;
pub mod layout;
pub mod resolve;
pub mod table;
pub mod volume;


pub use device::{MemStorage, Storage};
pub use entry::{attrs, DirEntry, EntryInfo, EntryKind, EntryPos, NAME_LEN};
pub use error::{CcfsError, Result};
pub use header::{VolumeHeader, LABEL_LEN};
pub use layout::{
    BLOCK_SIZE, DEFAULT_CAPACITY, END_OF_CHAIN, ENTRIES_PER_BLOCK, ENTRY_SIZE, FREE_BLOCK,
    MAX_CAPACITY, ROOT_BLOCK, TABLE_OFFSET,
};
pub use resolve::Records;
pub use table::{AllocationTable, Link};
pub use volume::{FormatOptions, Volume, VolumeInfo};
