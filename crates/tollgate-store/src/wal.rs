use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::account::AccountId;
use crate::error::{StoreError, StoreResult};
use crate::memory::InMemoryAccountStore;
use crate::traits::AccountStore;

/// A single durable state change.
///
/// On-disk format of every entry:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized WalRecord)]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalRecord {
    /// Account created with the given balance.
    Provisioned { account: AccountId, balance: u64 },
    /// One credit deducted; `balance` is the value after the deduction.
    Deducted { account: AccountId, balance: u64 },
}

/// Flush/sync strategy for the log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// `fsync` after every record. An approval is only reported once the
    /// deduction has reached the disk.
    #[default]
    EveryWrite,
    /// Flush to the OS page cache only (survives process crashes, not power loss).
    OsDefault,
}

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Upper bound on a single encoded record. Anything larger in a header is
/// corruption, not a record.
const MAX_RECORD_LEN: u32 = 64 * 1024;

/// Account store backed by a write-ahead log.
///
/// Every mutation is appended to the log and flushed before the in-memory
/// index is updated, so a failed write never leaves a half-applied deduction
/// and a returned balance is always recoverable after a restart. On open the
/// log is replayed front-to-back. Only an incomplete final entry is dropped
/// as a torn write; damage anywhere else fails the open with
/// [`StoreError::CorruptLog`] rather than losing committed deductions.
pub struct WalAccountStore {
    path: PathBuf,
    file: File,
    /// Byte length of the log up to the last fully written record.
    offset: u64,
    sync_mode: SyncMode,
    index: InMemoryAccountStore,
}

impl WalAccountStore {
    /// Open (or create) the log at `path` and rebuild balances from it.
    pub fn open(path: &Path, sync_mode: SyncMode) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let (records, valid_len) = read_records(&fs::read(path)?)?;
        let file_len = file.metadata()?.len();
        if valid_len < file_len {
            warn!(
                path = %path.display(),
                valid_len,
                file_len,
                "discarding torn tail of account log"
            );
            file.set_len(valid_len)?;
        }

        let mut index = InMemoryAccountStore::new();
        for (offset, record) in records {
            replay(&mut index, record, offset)?;
        }

        info!(
            path = %path.display(),
            accounts = index.len(),
            "account log recovered"
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            offset: valid_len,
            sync_mode,
            index,
        })
    }

    /// Path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current length of the log in bytes.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Rewrite the log as one `Provisioned` record per account at its
    /// current balance.
    ///
    /// The compacted log is written to a sibling file, synced, and renamed
    /// over the current one, so a crash mid-compaction leaves the old log
    /// intact. Later appends go through the handle that wrote the sibling;
    /// if any step fails the store keeps its handle on the old log.
    pub fn compact(&mut self) -> StoreResult<()> {
        let tmp_path = self.path.with_extension("compact");
        let mut buf = Vec::new();
        for (account, balance) in self.index.accounts()? {
            encode_frame(&WalRecord::Provisioned { account, balance }, &mut buf)?;
        }

        match fs::remove_file(&tmp_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        let mut tmp = OpenOptions::new()
            .create_new(true)
            .read(true)
            .append(true)
            .open(&tmp_path)?;
        let written = tmp
            .write_all(&buf)
            .and_then(|()| tmp.sync_all())
            .and_then(|()| fs::rename(&tmp_path, &self.path));
        if let Err(e) = written {
            drop(tmp);
            if let Err(cleanup) = fs::remove_file(&tmp_path) {
                warn!(error = %cleanup, path = %tmp_path.display(), "failed to remove compaction file");
            }
            return Err(e.into());
        }

        self.file = tmp;
        let before = self.offset;
        self.offset = buf.len() as u64;
        info!(before, after = self.offset, "account log compacted");
        Ok(())
    }

    /// Append one record. On failure the file is cut back to the last good
    /// record so later appends stay aligned.
    fn append(&mut self, record: &WalRecord) -> StoreResult<()> {
        let mut frame = Vec::new();
        encode_frame(record, &mut frame)?;

        if let Err(e) = self.write_frame(&frame) {
            if let Err(trunc) = self.file.set_len(self.offset) {
                warn!(error = %trunc, offset = self.offset, "failed to roll back partial log write");
            }
            return Err(e.into());
        }

        debug!(offset = self.offset, len = frame.len(), "account log append");
        self.offset += frame.len() as u64;
        Ok(())
    }

    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.file.write_all(frame)?;
        self.file.flush()?;
        if self.sync_mode == SyncMode::EveryWrite {
            self.file.sync_data()?;
        }
        Ok(())
    }
}

impl AccountStore for WalAccountStore {
    fn provision(&mut self, id: &AccountId, starting_balance: u64) -> StoreResult<bool> {
        if self.index.balance(id)?.is_some() {
            return Ok(false);
        }
        self.append(&WalRecord::Provisioned {
            account: id.clone(),
            balance: starting_balance,
        })?;
        self.index.provision(id, starting_balance)
    }

    fn balance(&self, id: &AccountId) -> StoreResult<Option<u64>> {
        self.index.balance(id)
    }

    fn apply_deduction(&mut self, id: &AccountId) -> StoreResult<u64> {
        let next = self.index.deducted_balance(id)?;
        self.append(&WalRecord::Deducted {
            account: id.clone(),
            balance: next,
        })?;
        self.index.set_balance(id.clone(), next);
        Ok(next)
    }

    fn ping(&self) -> StoreResult<()> {
        fs::metadata(&self.path)?;
        self.file.metadata()?;
        Ok(())
    }

    fn accounts(&self) -> StoreResult<Vec<(AccountId, u64)>> {
        self.index.accounts()
    }
}

impl std::fmt::Debug for WalAccountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalAccountStore")
            .field("path", &self.path)
            .field("offset", &self.offset)
            .field("sync_mode", &self.sync_mode)
            .field("account_count", &self.index.len())
            .finish()
    }
}

fn encode_frame(record: &WalRecord, out: &mut Vec<u8>) -> StoreResult<()> {
    let payload =
        bincode::serialize(record).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let length = u32::try_from(payload.len())
        .map_err(|_| StoreError::Serialization("record exceeds u32 length".into()))?;
    out.extend_from_slice(&length.to_le_bytes());
    out.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(())
}

/// Decode every record in `data`, returning them with their offsets and the
/// byte length of the log up to the end of the last complete frame.
///
/// A frame that runs past the end of the data, a CRC failure on the final
/// frame, or a zero-filled tail is a torn write and ends recovery. The same
/// damage followed by more data is corruption.
fn read_records(data: &[u8]) -> StoreResult<(Vec<(u64, WalRecord)>, u64)> {
    let mut records = Vec::new();
    let mut pos = 0usize;

    while pos < data.len() {
        let rest = &data[pos..];
        let offset = pos as u64;

        if rest.len() < HEADER_SIZE {
            warn!(offset, "partial header at end of log; stopping recovery");
            break;
        }

        let length = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]);
        let expected_crc = u32::from_le_bytes([rest[4], rest[5], rest[6], rest[7]]);

        if length == 0 {
            if rest.iter().all(|&b| b == 0) {
                warn!(offset, "zero-filled tail in log; stopping recovery");
                break;
            }
            return Err(corrupt(offset, "zero-length entry followed by data"));
        }
        if length > MAX_RECORD_LEN {
            return Err(corrupt(
                offset,
                format!("entry length {length} exceeds limit of {MAX_RECORD_LEN}"),
            ));
        }

        let end = HEADER_SIZE + length as usize;
        if rest.len() < end {
            warn!(offset, length, "truncated entry at end of log; stopping recovery");
            break;
        }

        let payload = &rest[HEADER_SIZE..end];
        let actual_crc = crc32fast::hash(payload);
        if actual_crc != expected_crc {
            if rest.len() == end {
                warn!(
                    offset,
                    expected = expected_crc,
                    actual = actual_crc,
                    "CRC mismatch on final log entry; stopping recovery"
                );
                break;
            }
            return Err(corrupt(
                offset,
                format!("CRC mismatch (expected {expected_crc:#010x}, got {actual_crc:#010x})"),
            ));
        }

        let record = bincode::deserialize::<WalRecord>(payload)
            .map_err(|e| corrupt(offset, format!("undecodable entry: {e}")))?;
        records.push((offset, record));
        pos += end;
    }

    Ok((records, pos as u64))
}

fn corrupt(offset: u64, reason: impl Into<String>) -> StoreError {
    StoreError::CorruptLog {
        offset,
        reason: reason.into(),
    }
}

fn replay(index: &mut InMemoryAccountStore, record: WalRecord, offset: u64) -> StoreResult<()> {
    match record {
        WalRecord::Provisioned { account, balance } => {
            index.set_balance(account, balance);
        }
        WalRecord::Deducted { account, balance } => {
            if index.balance(&account)?.is_none() {
                return Err(StoreError::CorruptLog {
                    offset,
                    reason: format!("deduction for unprovisioned account {account}"),
                });
            }
            index.set_balance(account, balance);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Seek, SeekFrom};

    fn avy() -> AccountId {
        AccountId::new("avy")
    }

    fn open(path: &Path) -> WalAccountStore {
        WalAccountStore::open(path, SyncMode::EveryWrite).unwrap()
    }

    // -----------------------------------------------------------------------
    // Durability across reopen
    // -----------------------------------------------------------------------

    #[test]
    fn balances_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.wal");

        {
            let mut store = open(&path);
            store.provision(&avy(), 5).unwrap();
            store.apply_deduction(&avy()).unwrap();
            store.apply_deduction(&avy()).unwrap();
        }

        let store = open(&path);
        assert_eq!(store.balance(&avy()).unwrap(), Some(3));
    }

    #[test]
    fn provisioning_after_restart_keeps_spent_balance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.wal");

        {
            let mut store = open(&path);
            store.provision(&avy(), 1).unwrap();
            store.apply_deduction(&avy()).unwrap();
        }

        let mut store = open(&path);
        assert!(!store.provision(&avy(), 1).unwrap());
        assert_eq!(store.balance(&avy()).unwrap(), Some(0));
    }

    #[test]
    fn empty_log_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = open(&dir.path().join("nested/dir/accounts.wal"));
        assert!(store.accounts().unwrap().is_empty());
        assert_eq!(store.offset(), 0);
    }

    #[test]
    fn failed_deduction_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.wal");
        let mut store = open(&path);
        store.provision(&avy(), 0).unwrap();
        let before = store.offset();

        assert!(matches!(
            store.apply_deduction(&avy()),
            Err(StoreError::Underflow(_))
        ));
        assert!(matches!(
            store.apply_deduction(&AccountId::new("ghost")),
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(store.offset(), before);
    }

    // -----------------------------------------------------------------------
    // Recovery from damage
    // -----------------------------------------------------------------------

    #[test]
    fn torn_tail_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.wal");

        let total = {
            let mut store = open(&path);
            store.provision(&avy(), 5).unwrap();
            store.apply_deduction(&avy()).unwrap();
            store.offset()
        };

        {
            let file = OpenOptions::new().write(true).open(&path).unwrap();
            file.set_len(total - 3).unwrap();
        }

        let mut store = open(&path);
        // The deduction record was torn; the account is back at its provisioned balance.
        assert_eq!(store.balance(&avy()).unwrap(), Some(5));
        assert!(store.offset() < total - 3);

        // New appends land after the last intact record.
        store.apply_deduction(&avy()).unwrap();
        drop(store);
        assert_eq!(open(&path).balance(&avy()).unwrap(), Some(4));
    }

    /// Rewrite the byte at `at` as `f(old)`.
    fn patch(path: &Path, at: u64, f: impl Fn(u8) -> u8) {
        let mut file = OpenOptions::new().read(true).write(true).open(path).unwrap();
        file.seek(SeekFrom::Start(at)).unwrap();
        let mut buf = [0u8; 1];
        file.read_exact(&mut buf).unwrap();
        buf[0] = f(buf[0]);
        file.seek(SeekFrom::Start(at)).unwrap();
        file.write_all(&buf).unwrap();
    }

    #[test]
    fn crc_mismatch_mid_log_refuses_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.wal");

        {
            let mut store = open(&path);
            store.provision(&avy(), 5).unwrap();
            store.provision(&AccountId::new("vaibhav"), 5).unwrap();
        }
        let len_before = fs::metadata(&path).unwrap().len();

        // Flip the first payload byte of the first record.
        patch(&path, HEADER_SIZE as u64, |b| b ^ 0xFF);

        let err = WalAccountStore::open(&path, SyncMode::EveryWrite).unwrap_err();
        assert!(matches!(err, StoreError::CorruptLog { offset: 0, .. }));
        assert_eq!(fs::metadata(&path).unwrap().len(), len_before);
    }

    #[test]
    fn crc_mismatch_on_last_entry_is_a_torn_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.wal");

        let (provisioned_len, total) = {
            let mut store = open(&path);
            store.provision(&avy(), 5).unwrap();
            let provisioned_len = store.offset();
            store.apply_deduction(&avy()).unwrap();
            (provisioned_len, store.offset())
        };

        patch(&path, total - 1, |b| b ^ 0xFF);

        let store = open(&path);
        assert_eq!(store.balance(&avy()).unwrap(), Some(5));
        assert_eq!(store.offset(), provisioned_len);
    }

    #[test]
    fn corrupt_length_mid_log_keeps_spent_credits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.wal");

        let first_deduction = {
            let mut store = open(&path);
            store.provision(&avy(), 5).unwrap();
            let first_deduction = store.offset();
            for _ in 0..5 {
                store.apply_deduction(&avy()).unwrap();
            }
            first_deduction
        };
        let len_before = fs::metadata(&path).unwrap().len();

        // High byte of the first deduction's length field.
        patch(&path, first_deduction + 3, |_| 0x10);

        let err = WalAccountStore::open(&path, SyncMode::EveryWrite).unwrap_err();
        assert!(matches!(
            err,
            StoreError::CorruptLog { offset, .. } if offset == first_deduction
        ));
        // Nothing after the damage was cut away.
        assert_eq!(fs::metadata(&path).unwrap().len(), len_before);
    }

    #[test]
    fn slightly_wrong_length_mid_log_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.wal");

        {
            let mut store = open(&path);
            store.provision(&avy(), 5).unwrap();
            store.apply_deduction(&avy()).unwrap();
            store.apply_deduction(&avy()).unwrap();
        }

        patch(&path, 0, |b| b.wrapping_add(1));

        assert!(matches!(
            WalAccountStore::open(&path, SyncMode::EveryWrite),
            Err(StoreError::CorruptLog { offset: 0, .. })
        ));
    }

    #[test]
    fn zero_filled_tail_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.wal");

        let total = {
            let mut store = open(&path);
            store.provision(&avy(), 5).unwrap();
            store.offset()
        };
        {
            let file = OpenOptions::new().write(true).open(&path).unwrap();
            file.set_len(total + 64).unwrap();
        }

        let store = open(&path);
        assert_eq!(store.balance(&avy()).unwrap(), Some(5));
        assert_eq!(fs::metadata(&path).unwrap().len(), total);
    }

    #[test]
    fn orphan_deduction_is_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.wal");
        let mut buf = Vec::new();
        encode_frame(
            &WalRecord::Deducted {
                account: avy(),
                balance: 4,
            },
            &mut buf,
        )
        .unwrap();
        fs::write(&path, &buf).unwrap();

        let err = WalAccountStore::open(&path, SyncMode::OsDefault).unwrap_err();
        assert!(matches!(err, StoreError::CorruptLog { offset: 0, .. }));
    }

    // -----------------------------------------------------------------------
    // Compaction and probes
    // -----------------------------------------------------------------------

    #[test]
    fn compact_shrinks_log_and_preserves_balances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.wal");

        let mut store = open(&path);
        store.provision(&avy(), 10).unwrap();
        for _ in 0..6 {
            store.apply_deduction(&avy()).unwrap();
        }
        let before = store.offset();

        store.compact().unwrap();
        assert!(store.offset() < before);
        store.apply_deduction(&avy()).unwrap();
        drop(store);

        let store = open(&path);
        assert_eq!(store.balance(&avy()).unwrap(), Some(3));
    }

    #[test]
    fn failed_compaction_keeps_appending_to_live_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.wal");

        let mut store = open(&path);
        store.provision(&avy(), 5).unwrap();
        store.apply_deduction(&avy()).unwrap();

        // Occupy the sibling path so the compacted file cannot be created.
        fs::create_dir(path.with_extension("compact")).unwrap();
        assert!(store.compact().is_err());

        store.apply_deduction(&avy()).unwrap();
        drop(store);
        assert_eq!(open(&path).balance(&avy()).unwrap(), Some(3));
    }

    #[test]
    fn compacted_store_appends_to_renamed_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.wal");

        let mut store = open(&path);
        store.provision(&avy(), 5).unwrap();
        store.compact().unwrap();
        store.compact().unwrap();
        store.apply_deduction(&avy()).unwrap();

        assert!(!path.with_extension("compact").exists());
        assert_eq!(fs::metadata(&path).unwrap().len(), store.offset());
        drop(store);
        assert_eq!(open(&path).balance(&avy()).unwrap(), Some(4));
    }

    #[test]
    fn ping_fails_when_log_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.wal");
        let store = open(&path);
        store.ping().unwrap();

        fs::remove_file(&path).unwrap();
        assert!(matches!(store.ping(), Err(StoreError::Io(_))));
    }

    #[test]
    fn sync_mode_parses_kebab_case() {
        let mode: SyncMode = serde_json::from_str("\"os-default\"").unwrap();
        assert_eq!(mode, SyncMode::OsDefault);
        assert_eq!(SyncMode::default(), SyncMode::EveryWrite);
    }
}
