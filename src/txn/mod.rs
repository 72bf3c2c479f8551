//! Transaction Handles Module
//!
//! The handles passed to `Database::read` and `Database::read_write`
//! callbacks.
//!
//! ## Responsibilities
//! - Scope every read to one group (`Reader` → `GroupReader`)
//! - Cursor navigation along the chronological list and version-history
//!   access with positional reads (`Cursor`, `History`)
//! - Stage write records in call order for the commit protocol
//!   (`Writer` → `GroupWriter`)
//!
//! Handles borrow the database state for the duration of the transaction
//! scope, so a cursor cannot outlive the lock that made it consistent.

mod read;
mod write;

pub use read::{Cursor, GroupReader, History, Reader};
pub use write::{GroupWriter, Writer};
