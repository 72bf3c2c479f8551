//! Database Module
//!
//! The engine entry point, coordinating all components.
//!
//! ## Responsibilities
//! - Open: replay the log, rebuild every group's index, heal a torn tail
//! - Hand out transaction scopes: `read` (shared) and `read_write`
//!   (exclusive)
//! - Run the commit protocol: encode staged records + commit marker into
//!   one buffer, append once, fsync, then apply to the indexes
//! - Track the poisoned state after an unrecoverable write failure

use std::collections::HashMap;
use std::path::PathBuf;

use parking_lot::RwLock;

use crate::config::Config;
use crate::error::{Result, StrataError};
use crate::format::{Codec, GroupId, Opcode, Record};
use crate::log::{rebuild, LogFile, Position};
use crate::memindex::MemIndex;
use crate::txn::{Reader, Writer};

/// Database state guarded by the reader-writer lock
#[derive(Debug)]
pub(crate) struct Inner {
    pub(crate) file: LogFile,
    pub(crate) codec: Codec,
    pub(crate) indexes: HashMap<GroupId, MemIndex>,

    /// Set when a partial append could not be rolled back. There is no
    /// consistent durable state to continue from, so every further write
    /// transaction is refused.
    pub(crate) wedged: bool,
}

/// An embedded database backed by one append-only log file.
///
/// Multiple threads may call [`read`](Database::read) concurrently; a
/// [`read_write`](Database::read_write) scope excludes everything else.
#[derive(Debug)]
pub struct Database {
    pub(crate) inner: RwLock<Inner>,
}

impl Database {
    /// Open (creating if absent) the database described by `config`,
    /// replaying the log to rebuild the in-memory indexes.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        let mut file = LogFile::open(&config.path)?;
        let codec = config.codec.clone();
        let mut indexes: HashMap<GroupId, MemIndex> = config
            .groups
            .iter()
            .map(|(&group, &buckets)| (group, MemIndex::new(buckets)))
            .collect();

        let report = rebuild(&mut file, &codec, &mut indexes)?;
        tracing::info!(
            path = %config.path.display(),
            records = report.records_replayed,
            size = report.size,
            truncated_tail = report.truncated_tail,
            groups = indexes.len(),
            "database opened"
        );

        Ok(Database {
            inner: RwLock::new(Inner {
                file,
                codec,
                indexes,
                wedged: false,
            }),
        })
    }

    /// Run `callback` with shared access. Any number of read scopes may
    /// proceed in parallel.
    pub fn read<T>(&self, callback: impl FnOnce(&Reader<'_>) -> Result<T>) -> Result<T> {
        let guard = self.inner.read();
        callback(&Reader::new(&guard))
    }

    /// Run `callback` with exclusive access. Writes staged through the
    /// [`Writer`] reach the file and the indexes only if `callback`
    /// returns `Ok`; on error the transaction leaves no trace.
    pub fn read_write<T>(
        &self,
        callback: impl FnOnce(&Reader<'_>, &mut Writer) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.inner.write();
        if guard.wedged {
            return Err(StrataError::Poisoned(
                "a previous write failure could not be rolled back".to_string(),
            ));
        }

        let mut writer = Writer::new(guard.codec.clone());
        let out = callback(&Reader::new(&guard), &mut writer)?;
        commit(&mut guard, writer.into_staged())?;
        Ok(out)
    }

    /// Logical log file size in bytes
    pub fn size(&self) -> u64 {
        self.inner.read().file.size()
    }

    /// Path of the log file
    pub fn path(&self) -> PathBuf {
        self.inner.read().file.path().to_path_buf()
    }

    /// Release both file descriptors. Callers must quiesce in-flight
    /// transactions first.
    pub fn close(self) -> Result<()> {
        let inner = self.inner.into_inner();
        tracing::info!(path = %inner.file.path().display(), "database closed");
        inner.file.close()
    }
}

/// Commit protocol: everything staged becomes durable before any index
/// changes, so a crash at any point here leaves at worst a torn tail for
/// recovery to heal.
fn commit(inner: &mut Inner, staged: Vec<Record>) -> Result<()> {
    // A transaction that staged nothing writes nothing.
    if staged.is_empty() {
        return Ok(());
    }

    // Every staged record must target a declared group, checked before
    // any encode or I/O.
    for record in &staged {
        if !inner.indexes.contains_key(&record.group) {
            return Err(StrataError::UnknownGroup(record.group));
        }
    }

    // Encode the whole transaction into one contiguous buffer, commit
    // marker last, remembering each record's place in the buffer.
    let mut buf = Vec::new();
    let mut layout = Vec::with_capacity(staged.len());
    for record in &staged {
        let encoded = inner.codec.encode(record)?;
        layout.push((buf.len() as u64, encoded.len() as u64));
        buf.extend_from_slice(&encoded);
    }
    buf.extend_from_slice(&inner.codec.encode(&Record::commit())?);

    // One append, one fsync.
    let start = match inner.file.append(&buf) {
        Ok(offset) => offset,
        Err(err) => {
            if matches!(err, StrataError::Poisoned(_)) {
                inner.wedged = true;
            }
            return Err(err);
        }
    };
    inner.file.sync()?;

    // The records are durable; apply them to the indexes.
    for (record, (relative, length)) in staged.iter().zip(layout.iter().copied()) {
        let Some(index) = inner.indexes.get_mut(&record.group) else {
            return Err(StrataError::UnknownGroup(record.group));
        };
        match record.op {
            Opcode::Put => index.put(
                &record.key,
                record.timestamp_ns,
                Position::new(start + relative, length),
            ),
            Opcode::Delete => index.delete(&record.key),
            Opcode::Commit => {}
        }
    }

    tracing::debug!(
        records = staged.len(),
        bytes = buf.len(),
        offset = start,
        "transaction committed"
    );
    Ok(())
}
