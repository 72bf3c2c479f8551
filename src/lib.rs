//! # StrataKV
//!
//! An embedded key-value storage engine with:
//! - A single append-only log file per database
//! - Transactional batching with crash-tail recovery
//! - Chronological iteration and per-key version history
//! - Single-writer/multi-reader concurrency model
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Transaction Layer                        │
//! │            read (shared) / read_write (exclusive)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   MemIndex  │          │  Log File   │
//!   │  (per group)│          │ (append +   │
//!   │             │          │  positional │
//!   │ hashtable + │          │  reads)     │
//!   │ chrono list │          └──────┬──────┘
//!   │ + versions  │                 │
//!   └─────────────┘                 ▼
//!                           ┌─────────────┐
//!                           │ Record Codec│
//!                           │ binary/text │
//!                           └─────────────┘
//! ```
//!
//! Writers stage records inside a `read_write` scope; on success the
//! whole batch plus a commit marker is appended with one write, fsynced,
//! and only then applied to the indexes. A crash mid-write can therefore
//! only tear the tail of the log, which recovery truncates away on the
//! next open.
//!
//! ## Example
//!
//! ```no_run
//! use stratakv::{Config, Database};
//!
//! # fn main() -> stratakv::Result<()> {
//! const USERS: u8 = b'u';
//!
//! let db = Database::open(Config::new("users.strata").group(USERS, 64))?;
//!
//! db.read_write(|_, w| w.group(USERS).put(b"007", b"James"))?;
//!
//! db.read(|r| {
//!     let users = r.group(USERS).expect("declared at open");
//!     let cursor = users.seek(b"007").expect("just written");
//!     assert_eq!(cursor.history().latest_value()?, b"James");
//!     Ok(())
//! })?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod format;

mod compact;
mod db;
mod log;
mod memindex;
mod txn;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use compact::CompactionStats;
pub use config::Config;
pub use db::Database;
pub use error::{Result, StrataError};
pub use format::{Codec, GroupId, Opcode, Record, TextSeparators};
pub use log::Position;
pub use memindex::Version;
pub use txn::{Cursor, GroupReader, GroupWriter, History, Reader, Writer};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of StrataKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
