//! Read handles: group lookup, cursor iteration, version history

use crate::db::Inner;
use crate::error::{Result, StrataError};
use crate::format::{Codec, Decoded, GroupId};
use crate::log::LogFile;
use crate::memindex::{MemIndex, Version};

/// Read handle covering the whole database, valid for one transaction scope
pub struct Reader<'txn> {
    inner: &'txn Inner,
}

impl<'txn> Reader<'txn> {
    pub(crate) fn new(inner: &'txn Inner) -> Self {
        Reader { inner }
    }

    /// Scope reads to one group. `None` for a group that was not declared
    /// at open time.
    pub fn group(&self, group: GroupId) -> Option<GroupReader<'txn>> {
        let index = self.inner.indexes.get(&group)?;
        Some(GroupReader {
            file: &self.inner.file,
            codec: &self.inner.codec,
            index,
        })
    }

    /// Number of declared groups
    pub fn group_count(&self) -> usize {
        self.inner.indexes.len()
    }
}

/// Read handle scoped to one group
pub struct GroupReader<'txn> {
    file: &'txn LogFile,
    codec: &'txn Codec,
    index: &'txn MemIndex,
}

impl<'txn> GroupReader<'txn> {
    /// Number of live keys (distinct keys whose latest op is a put)
    pub fn count(&self) -> usize {
        self.index.count()
    }

    pub fn exists(&self, key: &[u8]) -> bool {
        self.index.get(key).is_some()
    }

    /// Cursor at `key`, or `None` if the key is not live
    pub fn seek(&self, key: &[u8]) -> Option<Cursor<'txn>> {
        self.cursor_at(self.index.get(key)?)
    }

    /// Cursor at the least recently put key, or `None` when empty
    pub fn oldest(&self) -> Option<Cursor<'txn>> {
        self.cursor_at(self.index.oldest()?)
    }

    /// Cursor at the most recently put key, or `None` when empty
    pub fn latest(&self) -> Option<Cursor<'txn>> {
        self.cursor_at(self.index.latest()?)
    }

    /// Latest value of `key`, or `None` if the key is not live
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.seek(key) {
            Some(cursor) => Ok(Some(cursor.history().latest_value()?)),
            None => Ok(None),
        }
    }

    /// Visit every live key starting with `prefix`, in chronological
    /// order. The callback returns `false` to stop early.
    pub fn walk_prefix(&self, prefix: &[u8], mut visit: impl FnMut(&[u8]) -> bool) {
        let mut cursor = self.index.oldest();
        while let Some(slot) = cursor {
            let info = self.index.info(slot);
            if info.key.starts_with(prefix) && !visit(&info.key) {
                return;
            }
            cursor = info.next;
        }
    }

    /// Like [`walk_prefix`](Self::walk_prefix), also reading each key's
    /// latest value from the log.
    pub fn walk_prefix_values(
        &self,
        prefix: &[u8],
        mut visit: impl FnMut(&[u8], Vec<u8>) -> Result<bool>,
    ) -> Result<()> {
        let mut cursor = self.index.oldest();
        while let Some(slot) = cursor {
            let info = self.index.info(slot);
            if info.key.starts_with(prefix) {
                let history = History {
                    file: self.file,
                    codec: self.codec,
                    versions: &info.versions,
                };
                let value = history.latest_value()?;
                if !visit(&info.key, value)? {
                    return Ok(());
                }
            }
            cursor = info.next;
        }
        Ok(())
    }

    fn cursor_at(&self, slot: u32) -> Option<Cursor<'txn>> {
        Some(Cursor {
            file: self.file,
            codec: self.codec,
            index: self.index,
            slot,
        })
    }
}

// =============================================================================
// Cursor
// =============================================================================

/// Transient pointer to one live key. Valid only within the read scope
/// that produced it.
#[derive(Clone, Copy)]
pub struct Cursor<'txn> {
    file: &'txn LogFile,
    codec: &'txn Codec,
    index: &'txn MemIndex,
    slot: u32,
}

impl<'txn> Cursor<'txn> {
    /// The key this cursor points at
    pub fn key(&self) -> &'txn [u8] {
        &self.index.info(self.slot).key
    }

    /// Move to the next key in chronological order; `None` past the end
    pub fn next(self) -> Option<Cursor<'txn>> {
        let slot = self.index.info(self.slot).next?;
        Some(Cursor { slot, ..self })
    }

    /// Move to the previous key in chronological order; `None` past the start
    pub fn previous(self) -> Option<Cursor<'txn>> {
        let slot = self.index.info(self.slot).prev?;
        Some(Cursor { slot, ..self })
    }

    /// The version history of the current key
    pub fn history(&self) -> History<'txn> {
        History {
            file: self.file,
            codec: self.codec,
            versions: &self.index.info(self.slot).versions,
        }
    }
}

// =============================================================================
// History
// =============================================================================

/// The put history of one key, oldest version first
pub struct History<'txn> {
    file: &'txn LogFile,
    codec: &'txn Codec,
    versions: &'txn [Version],
}

impl History<'_> {
    /// Number of versions
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// The i-th version (oldest = 0), or `None` out of range
    pub fn version(&self, index: usize) -> Option<Version> {
        self.versions.get(index).copied()
    }

    /// Read the i-th version's value from the log
    pub fn value(&self, index: usize) -> Result<Vec<u8>> {
        let version = self
            .versions
            .get(index)
            .ok_or(StrataError::IndexOutOfRange {
                index,
                length: self.versions.len(),
            })?;

        let mut buf = vec![0u8; version.position.length as usize];
        self.file.read_at(&mut buf, version.position.offset)?;

        match self.codec.decode(&mut buf.as_slice())? {
            Decoded::Record { record, .. } => Ok(record.value),
            Decoded::Eof | Decoded::Truncated { .. } => Err(StrataError::Parse(
                "indexed record shorter than its recorded length".to_string(),
            )),
        }
    }

    /// The most recent value
    pub fn latest_value(&self) -> Result<Vec<u8>> {
        if self.versions.is_empty() {
            return Err(StrataError::IndexOutOfRange {
                index: 0,
                length: 0,
            });
        }
        self.value(self.versions.len() - 1)
    }
}
