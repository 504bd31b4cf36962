use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Opening, mapping or writing a file failed.
    #[error("io: {0}")]
    Io(#[from] io::Error),

    /// A box header or table does not fit the bytes it claims.
    #[error("malformed box at offset {offset:#x}: {reason}")]
    MalformedBox { offset: usize, reason: &'static str },

    /// A tree edit that would break an invariant. Nothing was changed.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    /// Chunk offsets cannot be rebased without an mdat box at the top level.
    #[error("no mdat box found")]
    MissingMediaData,

    /// A size or offset no longer fits its 32-bit field.
    #[error("{0} exceeds 32 bits")]
    TooLarge(&'static str),
}
