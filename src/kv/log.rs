//! Log-structured store
//!
//! Every mutation is appended to `{dir}/store.log`; the live map is rebuilt
//! from the log on open.
//!
//! ## Entry Format
//! ```text
//! ┌──────────┬─────────────┬─────────────┬───────┬─────────┐
//! │ CRC (4)  │ KeyLen (4)  │ ValLen (4)  │  Key  │  Value  │
//! └──────────┴─────────────┴─────────────┴───────┴─────────┘
//! ```
//! All integers are little-endian. The CRC covers everything after it.
//! `ValLen == u32::MAX` is a delete tombstone with no value bytes.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};

use crate::error::{Result, XdagError};

use super::memory::prefix_range;
use super::{KvPair, KvStore};

/// Name of the log inside the store directory
pub const LOG_FILENAME: &str = "store.log";

/// CRC (4) + KeyLen (4) + ValLen (4)
const ENTRY_HEADER_SIZE: usize = 12;

/// Sentinel value length marking a delete
const TOMBSTONE_MARKER: u32 = u32::MAX;

/// File operations the log writer needs beyond `Write`
trait LogFile: Write {
    fn truncate(&mut self, len: u64) -> std::io::Result<()>;
    fn sync(&mut self) -> std::io::Result<()>;
}

impl LogFile for File {
    fn truncate(&mut self, len: u64) -> std::io::Result<()> {
        self.set_len(len)
    }

    fn sync(&mut self) -> std::io::Result<()> {
        self.sync_data()
    }
}

/// Appends whole entries or nothing
///
/// `committed` is the log length up to the last acknowledged write. A failed
/// write is cut back to it; if that cut fails too the writer refuses further
/// appends.
struct LogWriter<F: LogFile = File> {
    file: F,
    committed: u64,
    fsync: bool,
    poisoned: bool,
}

impl<F: LogFile> LogWriter<F> {
    fn new(file: F, committed: u64, fsync: bool) -> Self {
        Self {
            file,
            committed,
            fsync,
            poisoned: false,
        }
    }

    fn append(&mut self, key: &[u8], value: Option<&[u8]>) -> Result<()> {
        let entry = encode_entry(key, value)?;
        self.write_committed(&entry)
    }

    fn append_batch(&mut self, pairs: &[(&[u8], &[u8])]) -> Result<()> {
        let mut batch = Vec::new();
        for (key, value) in pairs {
            batch.extend_from_slice(&encode_entry(key, Some(value))?);
        }
        self.write_committed(&batch)
    }

    fn write_committed(&mut self, bytes: &[u8]) -> Result<()> {
        if self.poisoned {
            return Err(XdagError::Store(
                "log is in an unknown state after a failed rollback".to_string(),
            ));
        }

        match self.write_through(bytes) {
            Ok(()) => {
                self.committed += bytes.len() as u64;
                Ok(())
            }
            Err(e) => {
                self.rollback();
                Err(e.into())
            }
        }
    }

    fn write_through(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.file.write_all(bytes)?;
        self.file.flush()?;
        if self.fsync {
            self.file.sync()?;
        }
        Ok(())
    }

    fn rollback(&mut self) {
        if let Err(e) = self.file.truncate(self.committed) {
            tracing::error!(
                "Failed to cut log back to {} bytes, refusing writes: {}",
                self.committed,
                e
            );
            self.poisoned = true;
        } else {
            tracing::warn!("Discarded partial append, log is {} bytes", self.committed);
        }
    }

    fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync()?;
        Ok(())
    }
}

/// Append-only log with an in-memory ordered index
///
/// ## Concurrency:
/// - `writer`: Mutex, one append at a time
/// - `index`: RwLock, updated while `writer` is held so log order and map
///   order agree
pub struct LogStore {
    path: PathBuf,
    writer: Mutex<LogWriter>,
    index: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl LogStore {
    /// Open or create a store in `dir`
    ///
    /// A torn or corrupt tail left by a crash is cut off before appending.
    pub fn open(dir: &Path, fsync: bool) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(LOG_FILENAME);

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;

        let (index, valid_len, replayed) = replay(&contents);
        if valid_len < contents.len() {
            tracing::warn!(
                "Truncating {} trailing bytes of {} after {} valid entries",
                contents.len() - valid_len,
                path.display(),
                replayed
            );
            file.set_len(valid_len as u64)?;
            file.sync_all()?;
        } else if replayed > 0 {
            tracing::debug!("Replayed {} entries from {}", replayed, path.display());
        }

        Ok(Self {
            path,
            writer: Mutex::new(LogWriter::new(file, valid_len as u64, fsync)),
            index: RwLock::new(index),
        })
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KvStore for LogStore {
    fn name(&self) -> &'static str {
        "log"
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.append(key, Some(value))?;
        self.index.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn pset(&self, pairs: &[(&[u8], &[u8])]) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.append_batch(pairs)?;
        let mut index = self.index.write();
        for (key, value) in pairs {
            index.insert(key.to_vec(), value.to_vec());
        }
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.index.read().get(key).cloned())
    }

    fn pget(&self, keys: &[&[u8]]) -> Result<Vec<Option<Vec<u8>>>> {
        let index = self.index.read();
        Ok(keys.iter().map(|key| index.get(*key).cloned()).collect())
    }

    fn del(&self, key: &[u8]) -> Result<bool> {
        let mut writer = self.writer.lock();
        if !self.index.read().contains_key(key) {
            return Ok(false);
        }
        writer.append(key, None)?;
        self.index.write().remove(key);
        Ok(true)
    }

    fn scan_prefix(&self, prefix: &[u8], limit: Option<usize>) -> Result<Vec<KvPair>> {
        let index = self.index.read();
        Ok(prefix_range(&*index, prefix)
            .take(limit.unwrap_or(usize::MAX))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn flush(&self) -> Result<()> {
        self.writer.lock().sync()
    }

    fn len(&self) -> usize {
        self.index.read().len()
    }
}

fn encode_entry(key: &[u8], value: Option<&[u8]>) -> Result<Vec<u8>> {
    let key_len = checked_len(key.len(), "key")?;
    let val_len = match value {
        Some(v) => checked_len(v.len(), "value")?,
        None => TOMBSTONE_MARKER,
    };

    let mut entry =
        Vec::with_capacity(ENTRY_HEADER_SIZE + key.len() + value.map_or(0, |v| v.len()));
    entry.extend_from_slice(&[0u8; 4]);
    entry.extend_from_slice(&key_len.to_le_bytes());
    entry.extend_from_slice(&val_len.to_le_bytes());
    entry.extend_from_slice(key);
    if let Some(v) = value {
        entry.extend_from_slice(v);
    }

    let crc = crc32fast::hash(&entry[4..]);
    entry[0..4].copy_from_slice(&crc.to_le_bytes());
    Ok(entry)
}

fn checked_len(len: usize, what: &str) -> Result<u32> {
    match u32::try_from(len) {
        Ok(n) if n != TOMBSTONE_MARKER => Ok(n),
        _ => Err(XdagError::Store(format!("{} too large: {} bytes", what, len))),
    }
}

/// Rebuild the map from a log image
///
/// Returns the map, the length of the valid prefix, and the entry count.
fn replay(log: &[u8]) -> (BTreeMap<Vec<u8>, Vec<u8>>, usize, u64) {
    let mut index = BTreeMap::new();
    let mut pos = 0;
    let mut count = 0;

    while pos + ENTRY_HEADER_SIZE <= log.len() {
        let crc = read_u32(&log[pos..]);
        let key_len = read_u32(&log[pos + 4..]) as usize;
        let val_len = read_u32(&log[pos + 8..]);

        let body_len = key_len
            + if val_len == TOMBSTONE_MARKER {
                0
            } else {
                val_len as usize
            };
        let end = pos + ENTRY_HEADER_SIZE + body_len;
        if end > log.len() {
            break;
        }
        if crc32fast::hash(&log[pos + 4..end]) != crc {
            break;
        }

        let key_start = pos + ENTRY_HEADER_SIZE;
        let key = log[key_start..key_start + key_len].to_vec();
        if val_len == TOMBSTONE_MARKER {
            index.remove(&key);
        } else {
            index.insert(key, log[key_start + key_len..end].to_vec());
        }

        pos = end;
        count += 1;
    }

    (index, pos, count)
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use tempfile::TempDir;

    /// Accepts `budget` more bytes, then fails every write
    struct FailingFile {
        file: File,
        budget: usize,
        fail_truncate: bool,
    }

    impl Write for FailingFile {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            let n = self.file.write(&buf[..buf.len().min(self.budget)])?;
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.file.flush()
        }
    }

    impl LogFile for FailingFile {
        fn truncate(&mut self, len: u64) -> io::Result<()> {
            if self.fail_truncate {
                return Err(io::Error::new(io::ErrorKind::Other, "read-only"));
            }
            self.file.set_len(len)
        }

        fn sync(&mut self) -> io::Result<()> {
            self.file.sync_data()
        }
    }

    fn failing_writer(dir: &Path, budget: usize) -> LogWriter<FailingFile> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(dir.join(LOG_FILENAME))
            .unwrap();
        LogWriter::new(
            FailingFile {
                file,
                budget,
                fail_truncate: false,
            },
            0,
            true,
        )
    }

    fn log_len(dir: &Path) -> u64 {
        fs::metadata(dir.join(LOG_FILENAME)).unwrap().len()
    }

    fn entry_len(key: &[u8], value: &[u8]) -> usize {
        encode_entry(key, Some(value)).unwrap().len()
    }

    #[test]
    fn test_failed_append_is_cut_back() {
        let temp = TempDir::new().unwrap();
        let first = entry_len(b"k1", b"v1");
        let mut writer = failing_writer(temp.path(), first + 5);

        writer.append(b"k1", Some(b"v1".as_slice())).unwrap();
        assert!(writer.append(b"k2", Some(b"v2".as_slice())).is_err());
        assert_eq!(log_len(temp.path()), first as u64);
        assert_eq!(writer.committed, first as u64);

        // Writes after the failure land right behind the last good entry
        writer.file.budget = usize::MAX;
        writer.append(b"k3", Some(b"v3".as_slice())).unwrap();
        drop(writer);

        let store = LogStore::open(temp.path(), true).unwrap();
        assert_eq!(store.get(b"k1").unwrap(), Some(b"v1".to_vec()));
        assert_eq!(store.get(b"k2").unwrap(), None);
        assert_eq!(store.get(b"k3").unwrap(), Some(b"v3".to_vec()));
        assert_eq!(log_len(temp.path()), (first + entry_len(b"k3", b"v3")) as u64);
    }

    #[test]
    fn test_failed_batch_leaves_nothing() {
        let temp = TempDir::new().unwrap();
        let mut writer = failing_writer(temp.path(), entry_len(b"a", b"1") * 2 + 3);
        let pairs: [(&[u8], &[u8]); 3] = [(b"a", b"1"), (b"b", b"2"), (b"c", b"3")];

        assert!(writer.append_batch(&pairs).is_err());
        assert_eq!(log_len(temp.path()), 0);
        assert_eq!(writer.committed, 0);
        drop(writer);

        let store = LogStore::open(temp.path(), true).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_failed_rollback_refuses_writes() {
        let temp = TempDir::new().unwrap();
        let mut writer = failing_writer(temp.path(), 3);
        writer.file.fail_truncate = true;

        assert!(writer.append(b"k1", Some(b"v1".as_slice())).is_err());

        writer.file.budget = usize::MAX;
        assert!(matches!(
            writer.append(b"k2", Some(b"v2".as_slice())),
            Err(XdagError::Store(_))
        ));
        assert_eq!(log_len(temp.path()), 3);
    }
}
