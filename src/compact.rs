//! Compaction
//!
//! Rewrites the log so it holds only the latest version of every live
//! key, reclaiming the space of overwritten and deleted records. Runs in
//! exclusive mode: records are copied verbatim into a sidecar file which
//! is fsynced and then atomically renamed over the log. Version histories
//! collapse to length one; commit markers are not carried over.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::db::Database;
use crate::error::{Result, StrataError};
use crate::format::GroupId;
use crate::log::{LogFile, Position};
use crate::memindex::MemIndex;

/// What a compaction pass accomplished
#[derive(Debug, Clone, Copy)]
pub struct CompactionStats {
    /// Logical log size before the rewrite
    pub bytes_before: u64,

    /// Logical log size after the rewrite
    pub bytes_after: u64,

    /// Live keys carried over (one record each)
    pub live_keys: usize,
}

impl Database {
    /// Rewrite the log keeping only each live key's latest version.
    ///
    /// Excludes readers and writers for the duration. On any failure the
    /// original log is untouched; a stale sidecar may remain and is
    /// overwritten by the next attempt.
    pub fn compact(&self) -> Result<CompactionStats> {
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        if inner.wedged {
            return Err(StrataError::Poisoned(
                "a previous write failure could not be rolled back".to_string(),
            ));
        }

        let path = inner.file.path().to_path_buf();
        let sidecar = sidecar_path(&path);
        let mut out = LogFile::create(&sidecar)?;

        // Copy each group's live records, oldest first, so the rewritten
        // log preserves chronological iteration order on replay.
        let mut rebuilt_indexes: HashMap<GroupId, MemIndex> =
            HashMap::with_capacity(inner.indexes.len());
        for (&group, index) in &inner.indexes {
            let mut rebuilt = MemIndex::new(index.bucket_count());
            let mut cursor = index.oldest();
            while let Some(slot) = cursor {
                let info = index.info(slot);
                if let Some(version) = info.versions.last() {
                    let mut record = vec![0u8; version.position.length as usize];
                    inner.file.read_at(&mut record, version.position.offset)?;
                    let offset = out.append(&record)?;
                    rebuilt.put(
                        &info.key,
                        version.timestamp_ns,
                        Position::new(offset, version.position.length),
                    );
                }
                cursor = info.next;
            }
            rebuilt_indexes.insert(group, rebuilt);
        }

        out.sync()?;
        drop(out);

        // Atomic swap, then fresh descriptors on the renamed file. The
        // old descriptors die with the replaced Inner fields.
        fs::rename(&sidecar, &path)?;
        let file = LogFile::open(&path)?;

        let stats = CompactionStats {
            bytes_before: inner.file.size(),
            bytes_after: file.size(),
            live_keys: rebuilt_indexes.values().map(MemIndex::count).sum(),
        };
        inner.file = file;
        inner.indexes = rebuilt_indexes;

        tracing::info!(
            bytes_before = stats.bytes_before,
            bytes_after = stats.bytes_after,
            live_keys = stats.live_keys,
            "log compacted"
        );
        Ok(stats)
    }
}

fn sidecar_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".compact");
    PathBuf::from(os)
}
