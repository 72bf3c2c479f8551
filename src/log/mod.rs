//! Log File Module
//!
//! Owns the single append-only file backing a database.
//!
//! ## Responsibilities
//! - Hold two descriptors to one path: a read-only descriptor for
//!   positional reads and a write-only descriptor for appends
//! - Track the logical file size (= next append offset)
//! - Roll a failed append back to the pre-write boundary
//! - Replay the log on open to rebuild every group's index, healing a
//!   torn tail left by a crash mid-write

mod file;
mod recovery;

pub(crate) use file::LogFile;
pub(crate) use recovery::{rebuild, RecoveryReport};

/// Location of one record's bytes in the log file. Immutable once written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub offset: u64,
    pub length: u64,
}

impl Position {
    pub fn new(offset: u64, length: u64) -> Self {
        Position { offset, length }
    }
}
