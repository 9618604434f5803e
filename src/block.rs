//! Raw XDAG blocks
//!
//! A block is one fixed-size 512-byte record of a shard file. Its identity is
//! the double SHA-256 of the record with the 8-byte transport header zeroed,
//! so nodes that rewrite transport bookkeeping still agree on the hash.
//!
//! ## Record Layout
//! ```text
//! ┌───────────────────┬──────────┬────────────────┬──────────────────────┐
//! │ Transport (8)     │ Type (8) │ Timestamp (8)  │ Fields ... (488)     │
//! │ excluded from hash│          │ u64 LE         │                      │
//! └───────────────────┴──────────┴────────────────┴──────────────────────┘
//! 0                   8          16               24                     512
//! ```

use std::fmt;

use bytes::Bytes;
use sha2::{Digest, Sha256};

use crate::address::{encode_address, HASH_LENGTH};
use crate::error::{Result, XdagError};

/// Size of one on-disk block record
pub const RAW_BLOCK_SIZE: usize = 512;

/// Bytes at the start of a record that do not take part in hashing
pub const TRANSPORT_HEADER_SIZE: usize = 8;

/// Byte range of the little-endian timestamp
const TIMESTAMP_RANGE: std::ops::Range<usize> = 16..24;

/// Immutable block reconstructed from a raw record
#[derive(Clone, PartialEq, Eq)]
pub struct RawBlock {
    hash: [u8; HASH_LENGTH],
    address: String,
    timestamp: u64,
    raw: Bytes,
}

impl RawBlock {
    /// Canonicalize a record
    ///
    /// Fails with `SizeMismatch` unless `raw` is exactly `RAW_BLOCK_SIZE`
    /// bytes. The record itself is kept as-is, transport header included.
    pub fn from_bytes(raw: Bytes) -> Result<Self> {
        let hash = content_hash(&raw)?;
        let timestamp = read_timestamp(&raw);
        let address = encode_address(&hash);

        Ok(Self {
            hash,
            address,
            timestamp,
            raw,
        })
    }

    /// Canonicalize a record from a borrowed slice (copies it)
    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        Self::from_bytes(Bytes::copy_from_slice(raw))
    }

    /// Content hash
    pub fn hash(&self) -> &[u8; HASH_LENGTH] {
        &self.hash
    }

    /// Display address of the content hash
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Timestamp stored in the record
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// The original record, exactly as read
    pub fn raw_bytes(&self) -> &Bytes {
        &self.raw
    }

    /// The transport header as found on disk
    pub fn transport_header(&self) -> [u8; TRANSPORT_HEADER_SIZE] {
        let mut header = [0u8; TRANSPORT_HEADER_SIZE];
        header.copy_from_slice(&self.raw[..TRANSPORT_HEADER_SIZE]);
        header
    }
}

impl fmt::Debug for RawBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBlock")
            .field("address", &self.address)
            .field("timestamp", &format_args!("{:#x}", self.timestamp))
            .field("len", &self.raw.len())
            .finish()
    }
}

/// Double SHA-256 of a record with its transport header treated as zero
///
/// Hashing the zero header followed by the rest of the record is the same as
/// hashing a zeroed copy, without touching the caller's bytes.
pub fn content_hash(raw: &[u8]) -> Result<[u8; HASH_LENGTH]> {
    if raw.len() != RAW_BLOCK_SIZE {
        return Err(XdagError::SizeMismatch {
            expected: RAW_BLOCK_SIZE,
            actual: raw.len(),
        });
    }

    let first = Sha256::new()
        .chain_update([0u8; TRANSPORT_HEADER_SIZE])
        .chain_update(&raw[TRANSPORT_HEADER_SIZE..])
        .finalize();

    Ok(Sha256::digest(first).into())
}

fn read_timestamp(raw: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&raw[TIMESTAMP_RANGE]);
    u64::from_le_bytes(buf)
}
