//! Chain traversal and path lookup
//!
//! A directory is a run of records starting at slot 0 of its first block.
//! Slots 0..=15 of a block are read in order; after slot 15 the walk moves
//! to slot 0 of the block the allocation table links to. The first record
//! with an empty name ends the directory.

use tracing::{debug, warn};

use crate::device::Storage;
use crate::entry::{DirEntry, EntryPos};
use crate::error::{CcfsError, Result};
use crate::layout::LAST_SLOT;
use crate::table::Link;
use crate::volume::Volume;

#[derive(Clone, Copy)]
enum Cursor {
    At(EntryPos),
    After(EntryPos),
    Done,
}

/// Raw walk over the records of one chain, empty slots included
///
/// Yields an error and stops if the chain cannot be followed.
pub struct Records<'a, S: Storage> {
    volume: &'a mut Volume<S>,
    cursor: Cursor,
    hops: u32,
}

impl<'a, S: Storage> Iterator for Records<'a, S> {
    type Item = Result<DirEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let pos = match self.cursor {
            Cursor::Done => return None,
            Cursor::At(pos) => pos,
            Cursor::After(prev) => match self.volume.step(prev, &mut self.hops) {
                Ok(Some(pos)) => pos,
                Ok(None) => {
                    self.cursor = Cursor::Done;
                    return None;
                }
                Err(e) => {
                    self.cursor = Cursor::Done;
                    return Some(Err(e));
                }
            },
        };

        match self.volume.read_entry(pos) {
            Ok(entry) => {
                self.cursor = Cursor::After(pos);
                Some(Ok(entry))
            }
            Err(e) => {
                self.cursor = Cursor::Done;
                Some(Err(e))
            }
        }
    }
}

impl<S: Storage> Volume<S> {
    /// Position of the record after `pos` in its chain
    ///
    /// `hops` counts block boundaries crossed so far; a chain that crosses
    /// more boundaries than the volume has blocks must contain a cycle.
    fn step(&self, pos: EntryPos, hops: &mut u32) -> Result<Option<EntryPos>> {
        if !pos.is_last_in_block() {
            return Ok(Some(EntryPos::new(pos.block, pos.slot + 1)));
        }

        let corrupt = |reason: &'static str| -> Result<Option<EntryPos>> {
            warn!(block = pos.block, reason, "cannot follow allocation chain");
            Err(CcfsError::CorruptChain {
                block: pos.block,
                reason,
            })
        };

        match self.table().link(pos.block) {
            Some(Link::End) => Ok(None),
            Some(Link::Next(next)) => {
                *hops += 1;
                if !self.table().contains(next) {
                    corrupt("link points outside the allocation table")
                } else if *hops >= self.capacity() {
                    corrupt("chain is longer than the volume")
                } else {
                    Ok(Some(EntryPos::first_in(next)))
                }
            }
            // 0 would read as a link back to the root block
            Some(Link::Free) => corrupt("chain runs through a free block"),
            None => corrupt("block outside the allocation table"),
        }
    }

    /// First record of a chain, checked against the table
    fn chain_start(&self, block: u16) -> Result<EntryPos> {
        if !self.table().contains(block) {
            return Err(CcfsError::CorruptChain {
                block,
                reason: "directory points outside the allocation table",
            });
        }
        Ok(EntryPos::first_in(block))
    }

    /// Walk every record slot of the chain starting at `start`
    pub fn records_from(&mut self, start: EntryPos) -> Records<'_, S> {
        Records {
            volume: self,
            cursor: Cursor::At(start),
            hops: 0,
        }
    }

    /// Blocks of the chain starting at `block`, in order
    pub fn chain(&self, block: u16) -> Result<Vec<u16>> {
        let mut pos = self.chain_start(block)?;
        let mut blocks = vec![pos.block];
        let mut hops = 0;

        loop {
            let last = EntryPos::new(pos.block, LAST_SLOT);
            match self.step(last, &mut hops)? {
                Some(next) => {
                    blocks.push(next.block);
                    pos = next;
                }
                None => return Ok(blocks),
            }
        }
    }

    /// Look up a record by absolute path, starting at the root directory
    pub fn resolve(&mut self, path: &str) -> Result<Option<DirEntry>> {
        self.resolve_at(EntryPos::ROOT, path)
    }

    /// Look up `path` inside the directory whose first record is `start`
    ///
    /// `Ok(None)` when a component is missing or a file is used as a
    /// directory. `/` names no record and never resolves.
    pub fn resolve_at(&mut self, start: EntryPos, path: &str) -> Result<Option<DirEntry>> {
        let mut dir = start;
        let mut rest = path;

        loop {
            let (component, remaining) = ccfs_path::split_first(rest)
                .ok_or_else(|| CcfsError::InvalidPath(path.to_string()))?;

            let found = match self.find_in_dir(dir, component)? {
                Some(found) => found,
                None => {
                    debug!(path, component, "lookup failed");
                    return Ok(None);
                }
            };

            if remaining.is_empty() {
                debug!(path, block = found.pos().block, slot = found.pos().slot, "resolved");
                return Ok(Some(found));
            }

            if !found.is_directory() {
                debug!(path, component, "cannot descend into a file");
                return Ok(None);
            }

            dir = self.chain_start(found.first_block())?;
            rest = remaining;
        }
    }

    /// Scan one directory for `name`, stopping at the first empty record
    pub fn find_in_dir(&mut self, start: EntryPos, name: &str) -> Result<Option<DirEntry>> {
        for record in self.records_from(start) {
            let record = record?;
            if record.is_empty() {
                return Ok(None);
            }
            if record.matches_name(name) {
                return Ok(Some(record));
            }
        }

        Ok(None)
    }

    /// Live records of the directory whose first record is `start`
    pub fn read_dir_at(&mut self, start: EntryPos) -> Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for record in self.records_from(start) {
            let record = record?;
            if record.is_empty() {
                break;
            }
            entries.push(record);
        }
        Ok(entries)
    }

    /// Live records of a directory
    pub fn read_dir(&mut self, dir: &DirEntry) -> Result<Vec<DirEntry>> {
        if !dir.is_directory() {
            return Err(CcfsError::NotADirectory(dir.name()));
        }
        let start = self.chain_start(dir.first_block())?;
        self.read_dir_at(start)
    }
}
