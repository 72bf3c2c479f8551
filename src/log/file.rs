//! Log file handle
//!
//! Two descriptors to the same path: reads go through a shared read-only
//! descriptor with `pread`-style positional calls, appends go through a
//! write-only descriptor at the tracked logical size. The logical size is
//! authoritative; the file never holds committed bytes past it.

use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use crate::error::{Result, StrataError};

#[derive(Debug)]
pub(crate) struct LogFile {
    path: PathBuf,
    reader: File,
    writer: File,
    size: u64,
}

impl LogFile {
    /// Open (creating if absent) the log file at `path`
    pub(crate) fn open(path: &Path) -> Result<Self> {
        // The writer goes first so the file exists before the read-only open.
        let writer = OpenOptions::new().write(true).create(true).open(path)?;
        let reader = File::open(path)?;
        let size = writer.metadata()?.len();
        Ok(LogFile {
            path: path.to_path_buf(),
            reader,
            writer,
            size,
        })
    }

    /// Open `path` truncated to zero bytes. Used for the compaction sidecar.
    pub(crate) fn create(path: &Path) -> Result<Self> {
        let writer = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        let reader = File::open(path)?;
        Ok(LogFile {
            path: path.to_path_buf(),
            reader,
            writer,
            size: 0,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Logical file size = next append offset
    pub(crate) fn size(&self) -> u64 {
        self.size
    }

    /// The shared read-only descriptor, for sequential replay
    pub(crate) fn reader(&self) -> &File {
        &self.reader
    }

    /// Append `bytes` at the current logical size, returning the start
    /// offset. On failure the file is rolled back to the pre-write size;
    /// if the rollback itself fails the error is `Poisoned` and the
    /// caller must refuse further writes.
    pub(crate) fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        let start = self.size;
        match self.writer.write_all_at(bytes, start) {
            Ok(()) => {
                self.size = start + bytes.len() as u64;
                Ok(start)
            }
            Err(write_err) => {
                if let Err(truncate_err) = self.writer.set_len(start) {
                    return Err(StrataError::Poisoned(format!(
                        "append failed ({write_err}) and rollback truncation to offset {start} failed ({truncate_err})"
                    )));
                }
                self.size = start;
                Err(StrataError::Io(write_err))
            }
        }
    }

    /// Positional read of exactly `buf.len()` bytes at `offset`
    pub(crate) fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<()> {
        self.reader.read_exact_at(buf, offset)?;
        Ok(())
    }

    /// Flush OS buffers to durable storage
    pub(crate) fn sync(&self) -> Result<()> {
        self.writer.sync_all()?;
        Ok(())
    }

    /// Shrink the file and reset the logical size
    pub(crate) fn truncate(&mut self, new_size: u64) -> Result<()> {
        self.writer.set_len(new_size)?;
        self.size = new_size;
        Ok(())
    }

    pub(crate) fn set_size(&mut self, size: u64) {
        self.size = size;
    }

    /// Release both descriptors, surfacing any pending write-back error
    pub(crate) fn close(self) -> Result<()> {
        self.writer.sync_all()?;
        Ok(())
    }
}
