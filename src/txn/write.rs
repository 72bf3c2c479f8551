//! Write handle: staged records awaiting commit

use crate::error::Result;
use crate::format::{Codec, GroupId, Record};

/// Write handle for one `read_write` scope. Records are staged in call
/// order and reach the file only when the callback returns successfully.
pub struct Writer {
    codec: Codec,
    staged: Vec<Record>,
}

impl Writer {
    pub(crate) fn new(codec: Codec) -> Self {
        Writer {
            codec,
            staged: Vec::new(),
        }
    }

    /// Scope writes to one group. Whether the group was declared is
    /// checked at commit time, before any I/O.
    pub fn group(&mut self, group: GroupId) -> GroupWriter<'_> {
        GroupWriter {
            writer: self,
            group,
        }
    }

    /// Number of records staged so far
    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }

    pub(crate) fn into_staged(self) -> Vec<Record> {
        self.staged
    }
}

/// Write handle scoped to one group
pub struct GroupWriter<'w> {
    writer: &'w mut Writer,
    group: GroupId,
}

impl GroupWriter<'_> {
    /// Stage a put. Length bounds (and separator collisions under the
    /// text format) are rejected here, before the record is staged.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let record = Record::put(self.group, key.to_vec(), value.to_vec());
        self.writer.codec.validate(&record)?;
        self.writer.staged.push(record);
        Ok(())
    }

    /// Stage a delete. Deleting an absent key commits as a no-op.
    pub fn delete(&mut self, key: &[u8]) -> Result<()> {
        let record = Record::delete(self.group, key.to_vec());
        self.writer.codec.validate(&record)?;
        self.writer.staged.push(record);
        Ok(())
    }
}
