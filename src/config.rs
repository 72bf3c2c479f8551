//! Configuration for StrataKV
//!
//! The only open-time knobs: the log file path, the record codec, and the
//! declared groups with their hashtable bucket counts. Groups cannot be
//! added after open.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{Result, StrataError};
use crate::format::{Codec, GroupId, COMMIT_GROUP_ID};

/// Open-time configuration for one database
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Log file path; created if absent
    pub path: PathBuf,

    /// Record codec used for the life of the file. Must match the file's
    /// actual encoding; the codec is not stored on disk.
    pub codec: Codec,

    /// Declared groups and their bucket counts (0 falls back to 1)
    pub groups: HashMap<GroupId, usize>,
}

impl Config {
    /// Configuration with the binary codec and no groups declared yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Config {
            path: path.into(),
            codec: Codec::binary(),
            groups: HashMap::new(),
        }
    }

    /// Select the record codec
    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    /// Declare a group with its hashtable bucket count
    pub fn group(mut self, group: GroupId, bucket_count: usize) -> Self {
        self.groups.insert(group, bucket_count);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(StrataError::Config("missing log file path".to_string()));
        }
        if self.groups.contains_key(&COMMIT_GROUP_ID) {
            return Err(StrataError::Config(format!(
                "group id 0x{COMMIT_GROUP_ID:02x} is reserved for commit markers"
            )));
        }
        Ok(())
    }
}
