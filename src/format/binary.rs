//! Binary record codec
//!
//! Fixed 15-byte header followed by the raw key and value bytes. All
//! multi-byte integers are big-endian. This is the default format.

use std::io::Read;

use crate::error::{Result, StrataError};

use super::{check_lengths, read_full, Decoded, Opcode, Record};

/// Header size: op (1) + group (1) + timestamp (8) + key_len (1) + value_len (4)
pub const BINARY_HEADER_LEN: usize = 15;

/// The big-endian binary file format
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl BinaryCodec {
    /// Encode one record: header, then key, then value
    pub fn encode(&self, record: &Record) -> Result<Vec<u8>> {
        check_lengths(&record.key, &record.value)?;

        let mut out = Vec::with_capacity(BINARY_HEADER_LEN + record.key.len() + record.value.len());
        out.push(record.op.as_byte());
        out.push(record.group);
        out.extend_from_slice(&record.timestamp_ns.to_be_bytes());
        out.push(record.key.len() as u8);
        out.extend_from_slice(&(record.value.len() as u32).to_be_bytes());
        out.extend_from_slice(&record.key);
        out.extend_from_slice(&record.value);
        Ok(out)
    }

    /// Decode one record from `reader`.
    ///
    /// Running out of input with nothing read is a clean EOF; running out
    /// mid-header or mid-body is a truncated tail. An op byte outside the
    /// known set in a complete header is an `IllegalOp` error.
    pub fn decode<R: Read>(&self, reader: &mut R) -> Result<Decoded> {
        let mut header = [0u8; BINARY_HEADER_LEN];
        let got = read_full(reader, &mut header)?;
        if got == 0 {
            return Ok(Decoded::Eof);
        }
        if got < BINARY_HEADER_LEN {
            return Ok(Decoded::Truncated {
                consumed: got as u64,
            });
        }

        let op = Opcode::from_byte(header[0]).ok_or(StrataError::IllegalOp(header[0]))?;
        let group = header[1];
        let mut timestamp = [0u8; 8];
        timestamp.copy_from_slice(&header[2..10]);
        let timestamp_ns = u64::from_be_bytes(timestamp);
        let key_len = header[10] as usize;
        let value_len = u32::from_be_bytes([header[11], header[12], header[13], header[14]]) as usize;

        let mut body = vec![0u8; key_len + value_len];
        let got_body = read_full(reader, &mut body)?;
        if got_body < body.len() {
            return Ok(Decoded::Truncated {
                consumed: (got + got_body) as u64,
            });
        }

        let value = body.split_off(key_len);
        Ok(Decoded::Record {
            record: Record {
                op,
                group,
                timestamp_ns,
                key: body,
                value,
            },
            len: (BINARY_HEADER_LEN + key_len + value_len) as u64,
        })
    }
}
