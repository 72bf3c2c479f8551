//! Error types for StrataKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::format::GroupId;

/// Result type alias using StrataError
pub type Result<T> = std::result::Result<T, StrataError>;

/// Unified error type for StrataKV operations
#[derive(Debug, Error)]
pub enum StrataError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Log Errors
    // -------------------------------------------------------------------------
    #[error("log corruption at offset {offset}: {detail}")]
    Corruption { offset: u64, detail: String },

    #[error("unknown group id 0x{0:02x}")]
    UnknownGroup(GroupId),

    #[error("illegal op byte 0x{0:02x}")]
    IllegalOp(u8),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("key too long: {0} bytes (max 255)")]
    KeyTooLong(usize),

    #[error("value too long: {0} bytes (max 4294967295)")]
    ValueTooLong(usize),

    #[error("{field} contains separator byte 0x{separator:02x}")]
    SeparatorCollision { field: &'static str, separator: u8 },

    #[error("record parse failed: {0}")]
    Parse(String),

    // -------------------------------------------------------------------------
    // Read Errors
    // -------------------------------------------------------------------------
    #[error("history index {index} out of range (length {length})")]
    IndexOutOfRange { index: usize, length: usize },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Terminal Failure
    // -------------------------------------------------------------------------
    /// A partial append could not be rolled back. The engine refuses all
    /// further write transactions once in this state.
    #[error("engine poisoned: {0}")]
    Poisoned(String),
}
