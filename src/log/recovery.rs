//! Log replay
//!
//! On open the whole log is decoded from offset 0 to rebuild every
//! declared group's index. The commit discipline guarantees a crash can
//! only tear the tail of the file, so a record cut short by end-of-input
//! is healed by truncating back to its start; everything else that fails
//! to decode is real corruption and aborts the open.

use std::collections::HashMap;
use std::io::{BufReader, Seek, SeekFrom};

use crate::error::{Result, StrataError};
use crate::format::{Codec, Decoded, GroupId, Opcode};
use crate::memindex::MemIndex;

use super::{LogFile, Position};

/// What replay did, logged by `Database::open`
#[derive(Debug)]
pub(crate) struct RecoveryReport {
    /// Number of records successfully replayed
    pub records_replayed: u64,

    /// Recovered logical file size
    pub size: u64,

    /// Whether a torn trailing record was truncated away
    pub truncated_tail: bool,
}

/// Replay `file` from offset 0 into `indexes` (one empty `MemIndex` per
/// declared group). Heals a torn tail by truncating to the last good
/// record boundary.
pub(crate) fn rebuild(
    file: &mut LogFile,
    codec: &Codec,
    indexes: &mut HashMap<GroupId, MemIndex>,
) -> Result<RecoveryReport> {
    let mut size = 0u64;
    let mut records_replayed = 0u64;
    let mut truncate_to: Option<u64> = None;

    {
        let mut raw = file.reader();
        raw.seek(SeekFrom::Start(0))?;
        let mut reader = BufReader::new(raw);

        loop {
            let record_start = size;
            match codec.decode(&mut reader) {
                Ok(Decoded::Record { record, len }) => {
                    size += len;
                    records_replayed += 1;
                    match record.op {
                        // Boundary marker: no index change, and exempt from
                        // the declared-group check (its group id is the
                        // reserved commit tag).
                        Opcode::Commit => {}
                        Opcode::Put => {
                            let index = indexes
                                .get_mut(&record.group)
                                .ok_or(StrataError::UnknownGroup(record.group))?;
                            index.put(
                                &record.key,
                                record.timestamp_ns,
                                Position::new(record_start, len),
                            );
                        }
                        Opcode::Delete => {
                            let index = indexes
                                .get_mut(&record.group)
                                .ok_or(StrataError::UnknownGroup(record.group))?;
                            index.delete(&record.key);
                        }
                    }
                }
                Ok(Decoded::Eof) => break,
                Ok(Decoded::Truncated { consumed }) => {
                    tracing::warn!(
                        offset = record_start,
                        partial_bytes = consumed,
                        "torn record at end of log, truncating"
                    );
                    truncate_to = Some(record_start);
                    break;
                }
                Err(StrataError::Parse(detail)) => {
                    return Err(StrataError::Corruption {
                        offset: record_start,
                        detail,
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }

    let truncated_tail = truncate_to.is_some();
    if let Some(boundary) = truncate_to {
        file.truncate(boundary)?;
    } else {
        file.set_size(size);
    }

    Ok(RecoveryReport {
        records_replayed,
        size: file.size(),
        truncated_tail,
    })
}
