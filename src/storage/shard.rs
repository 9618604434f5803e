//! Shard file reader
//!
//! A shard is a flat concatenation of 512-byte records with no header,
//! footer or index. Record `i` is `bytes[i*512 .. (i+1)*512]`.

use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::block::{RawBlock, RAW_BLOCK_SIZE};
use crate::error::{Result, XdagError};

/// An open shard whose length has been validated
pub struct ShardReader {
    path: PathBuf,
    file: File,
    len: u64,
}

impl ShardReader {
    /// Open a shard file
    ///
    /// Returns:
    /// - `Ok(Some(reader))`: file exists and holds whole records
    /// - `Ok(None)`: no file at `path`, or a path component is not a directory
    /// - `Err(Corruption)`: length is not a multiple of the record size
    /// - `Err(Io)`: anything else, including `path` being a directory
    pub fn open(path: &Path) -> Result<Option<Self>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if is_absent(&e) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let metadata = file.metadata()?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            )
            .into());
        }

        let len = metadata.len();
        if len % RAW_BLOCK_SIZE as u64 != 0 {
            return Err(XdagError::Corruption {
                path: path.to_path_buf(),
                len,
            });
        }

        Ok(Some(Self {
            path: path.to_path_buf(),
            file,
            len,
        }))
    }

    /// Number of records in the shard
    pub fn record_count(&self) -> usize {
        (self.len / RAW_BLOCK_SIZE as u64) as usize
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and canonicalize every record, in file order
    ///
    /// The file is read into one buffer; each block holds a slice of it.
    pub fn read_blocks(mut self) -> Result<Vec<RawBlock>> {
        let mut buffer = vec![0u8; self.len as usize];
        self.file.read_exact(&mut buffer)?;
        let buffer = Bytes::from(buffer);

        (0..self.record_count())
            .map(|i| RawBlock::from_bytes(buffer.slice(i * RAW_BLOCK_SIZE..(i + 1) * RAW_BLOCK_SIZE)))
            .collect()
    }
}

/// Errors that mean "nothing stored here" rather than a failed read
pub(super) fn is_absent(e: &io::Error) -> bool {
    matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}
