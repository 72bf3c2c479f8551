//! Text record codec
//!
//! One record per line: op, group, RFC 3339 timestamp, key, value, each
//! field closed by its own separator byte. Separators are configurable at
//! open time and must match the file's actual encoding; they are not
//! stored in the file.
//!
//! Encoding fails when the op byte, group byte, key, or value contain
//! their own separator. Timestamps keep nanosecond precision so a
//! round-trip through the text format loses nothing.

use std::io::BufRead;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

use crate::error::{Result, StrataError};

use super::{check_lengths, Decoded, Opcode, Record};

/// Separator byte closing each field of a text record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSeparators {
    pub op: u8,
    pub group: u8,
    pub timestamp: u8,
    pub key: u8,
    /// Terminates the record
    pub value: u8,
}

impl Default for TextSeparators {
    fn default() -> Self {
        TextSeparators {
            op: b' ',
            group: b' ',
            timestamp: b' ',
            key: b' ',
            value: b'\n',
        }
    }
}

/// The separator-delimited text file format
#[derive(Debug, Clone)]
pub struct TextCodec {
    separators: TextSeparators,
}

impl TextCodec {
    pub fn new(separators: TextSeparators) -> Self {
        TextCodec { separators }
    }

    pub fn separators(&self) -> TextSeparators {
        self.separators
    }

    /// Reject any field whose bytes collide with its own separator
    pub(crate) fn check_collisions(&self, record: &Record) -> Result<()> {
        let seps = self.separators;
        if record.op.as_byte() == seps.op {
            return Err(StrataError::SeparatorCollision {
                field: "op",
                separator: seps.op,
            });
        }
        if record.group == seps.group {
            return Err(StrataError::SeparatorCollision {
                field: "group id",
                separator: seps.group,
            });
        }
        if record.key.contains(&seps.key) {
            return Err(StrataError::SeparatorCollision {
                field: "key",
                separator: seps.key,
            });
        }
        if record.value.contains(&seps.value) {
            return Err(StrataError::SeparatorCollision {
                field: "value",
                separator: seps.value,
            });
        }
        Ok(())
    }

    /// Encode one record as a delimited line
    pub fn encode(&self, record: &Record) -> Result<Vec<u8>> {
        check_lengths(&record.key, &record.value)?;
        self.check_collisions(record)?;

        let seps = self.separators;
        let timestamp = Utc
            .timestamp_nanos(record.timestamp_ns as i64)
            .to_rfc3339_opts(SecondsFormat::Nanos, true);

        let mut out = Vec::with_capacity(2 + 2 + timestamp.len() + 1 + record.key.len() + 1 + record.value.len() + 1);
        out.push(record.op.as_byte());
        out.push(seps.op);
        out.push(record.group);
        out.push(seps.group);
        out.extend_from_slice(timestamp.as_bytes());
        out.push(seps.timestamp);
        out.extend_from_slice(&record.key);
        out.push(seps.key);
        out.extend_from_slice(&record.value);
        out.push(seps.value);
        Ok(out)
    }

    /// Decode one record from `reader`.
    ///
    /// A field left unterminated by the end of input marks a truncated
    /// tail; an unparseable field in a terminated record is a parse error.
    pub fn decode<R: BufRead>(&self, reader: &mut R) -> Result<Decoded> {
        let seps = self.separators;
        let mut consumed = 0u64;

        // Op
        let op_field = match read_field(reader, seps.op, &mut consumed)? {
            Field::Complete(bytes) => bytes,
            Field::Missing => return Ok(Decoded::Eof),
            Field::Unterminated => return Ok(Decoded::Truncated { consumed }),
        };
        let op_byte = single_byte(&op_field, "op")?;
        let op = Opcode::from_byte(op_byte).ok_or(StrataError::IllegalOp(op_byte))?;

        // Group id
        let group_field = match read_field(reader, seps.group, &mut consumed)? {
            Field::Complete(bytes) => bytes,
            Field::Missing | Field::Unterminated => return Ok(Decoded::Truncated { consumed }),
        };
        let group = single_byte(&group_field, "group id")?;

        // Timestamp
        let ts_field = match read_field(reader, seps.timestamp, &mut consumed)? {
            Field::Complete(bytes) => bytes,
            Field::Missing | Field::Unterminated => return Ok(Decoded::Truncated { consumed }),
        };
        let timestamp_ns = parse_rfc3339_nanos(&ts_field)?;

        // Key
        let key = match read_field(reader, seps.key, &mut consumed)? {
            Field::Complete(bytes) => bytes,
            Field::Missing | Field::Unterminated => return Ok(Decoded::Truncated { consumed }),
        };

        // Value
        let value = match read_field(reader, seps.value, &mut consumed)? {
            Field::Complete(bytes) => bytes,
            Field::Missing | Field::Unterminated => return Ok(Decoded::Truncated { consumed }),
        };

        Ok(Decoded::Record {
            record: Record {
                op,
                group,
                timestamp_ns,
                key,
                value,
            },
            len: consumed,
        })
    }
}

enum Field {
    /// Field bytes, separator stripped
    Complete(Vec<u8>),
    /// Input exhausted before the field started
    Missing,
    /// Input exhausted inside the field
    Unterminated,
}

fn read_field<R: BufRead>(reader: &mut R, separator: u8, consumed: &mut u64) -> Result<Field> {
    let mut buf = Vec::new();
    let n = reader.read_until(separator, &mut buf)?;
    *consumed += n as u64;
    if n == 0 {
        return Ok(Field::Missing);
    }
    if buf.last() != Some(&separator) {
        return Ok(Field::Unterminated);
    }
    buf.pop();
    Ok(Field::Complete(buf))
}

fn single_byte(field: &[u8], name: &str) -> Result<u8> {
    match field {
        [byte] => Ok(*byte),
        _ => Err(StrataError::Parse(format!(
            "{name} field is {} bytes, expected exactly one",
            field.len()
        ))),
    }
}

fn parse_rfc3339_nanos(field: &[u8]) -> Result<u64> {
    let text = std::str::from_utf8(field)
        .map_err(|err| StrataError::Parse(format!("timestamp is not UTF-8: {err}")))?;
    let parsed = DateTime::parse_from_rfc3339(text)
        .map_err(|err| StrataError::Parse(format!("bad RFC 3339 timestamp {text:?}: {err}")))?;
    let nanos = parsed
        .timestamp_nanos_opt()
        .ok_or_else(|| StrataError::Parse(format!("timestamp {text:?} outside nanosecond range")))?;
    Ok(nanos.max(0) as u64)
}
