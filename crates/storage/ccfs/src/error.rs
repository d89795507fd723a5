//! CCFS error types

use std::io;
use std::path::PathBuf;

/// CCFS Result type
pub type Result<T> = std::result::Result<T, CcfsError>;

/// Failures raised by volume operations
///
/// A path that does not resolve is not an error; lookups return `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum CcfsError {
    /// Host file could not be opened
    #[error("cannot open volume {}: {source}", path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Header magic is not "CCFS"
    #[error("not a CCFS volume (magic {0:02x?})")]
    BadMagic([u8; 4]),

    /// Image ends before the header or allocation table does
    #[error("image truncated: {0}")]
    Truncated(&'static str),

    /// Header capacity is outside 1..=MAX_CAPACITY
    #[error("invalid capacity: {0} blocks")]
    InvalidCapacity(u32),

    /// Read or write against the storage handle failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Name does not fit in a directory record
    #[error("name too long: {0} bytes")]
    NameTooLong(usize),

    /// Name holds a byte a lookup can never match
    #[error("invalid name: {0:?}")]
    InvalidName(String),

    /// Lookup path is not absolute
    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    /// Record listed as a directory is not one
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Allocation table link that cannot be followed
    #[error("corrupt chain at block {block}: {reason}")]
    CorruptChain { block: u16, reason: &'static str },
}

impl CcfsError {
    /// Errors that mean the image itself is unusable
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            CcfsError::BadMagic(_) | CcfsError::Truncated(_) | CcfsError::InvalidCapacity(_)
        )
    }
}
