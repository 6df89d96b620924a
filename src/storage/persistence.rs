//! Write-ahead log and snapshot persistence for the durable employee store

use crate::core::{Employee, EmployeeId, Result, StoreError};
use crate::storage::table::EmployeeTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::NamedTempFile;
use tracing::{error, info, warn};

pub const WAL_FILE_NAME: &str = "employees.wal";
pub const SNAPSHOT_FILE_NAME: &str = "employees.snapshot";
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;
pub const DEFAULT_CHECKPOINT_THRESHOLD: usize = 1000;

// ============================================================================
// WAL Entry Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalEntry {
    Put { key: EmployeeId, employee: Employee },
    Delete { key: EmployeeId },
}

impl WalEntry {
    pub fn apply(self, table: &mut EmployeeTable) {
        match self {
            WalEntry::Put { key, employee } => table.put(key, employee),
            WalEntry::Delete { key } => {
                table.remove(key);
            }
        }
    }
}

// ============================================================================
// Snapshot
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    pub table: EmployeeTable,
    pub metadata: SnapshotMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub created_at: DateTime<Utc>,
    pub row_count: usize,
}

impl StoreSnapshot {
    pub fn new(table: EmployeeTable) -> Self {
        let row_count = table.len();
        Self {
            version: SNAPSHOT_FORMAT_VERSION,
            table,
            metadata: SnapshotMetadata {
                created_at: Utc::now(),
                row_count,
            },
        }
    }
}

// ============================================================================
// Durability Configuration
// ============================================================================

/// How hard the WAL pushes each entry towards the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurabilityMode {
    /// Flush and fsync after every entry.
    #[default]
    Sync,
    /// Flush to the OS, no fsync.
    Async,
    /// No WAL and no snapshots.
    None,
}

impl FromStr for DurabilityMode {
    type Err = String;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sync" => Ok(Self::Sync),
            "async" => Ok(Self::Async),
            "none" => Ok(Self::None),
            other => Err(format!(
                "unknown durability mode '{}', expected sync, async or none",
                other
            )),
        }
    }
}

// ============================================================================
// WAL Manager
// ============================================================================

pub struct WalManager {
    wal_path: PathBuf,
    wal_file: Option<File>,
    /// Length of the log up to the end of the last entry that was fully
    /// written. A failed append is cut back to this point.
    committed_len: u64,
    durability_mode: DurabilityMode,
    entries_since_checkpoint: usize,
    checkpoint_threshold: usize,
    #[cfg(test)]
    fail_next_append_after: Option<usize>,
}

impl WalManager {
    pub fn new<P: AsRef<Path>>(wal_path: P, durability_mode: DurabilityMode) -> Result<Self> {
        let wal_path = wal_path.as_ref().to_path_buf();
        if let Some(parent) = wal_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StoreError::io("Failed to create WAL directory", e))?;
        }

        let (wal_file, committed_len) = if durability_mode != DurabilityMode::None {
            let file = open_for_append(&wal_path)?;
            let len = file
                .metadata()
                .map_err(|e| StoreError::io("Failed to stat WAL", e))?
                .len();
            (Some(file), len)
        } else {
            (None, 0)
        };

        Ok(Self {
            wal_path,
            wal_file,
            committed_len,
            durability_mode,
            entries_since_checkpoint: 0,
            checkpoint_threshold: DEFAULT_CHECKPOINT_THRESHOLD,
            #[cfg(test)]
            fail_next_append_after: None,
        })
    }

    /// Appends one entry. On failure the log is truncated back to the last
    /// complete entry, so a failed append never shadows later ones.
    pub fn append(&mut self, entry: &WalEntry) -> Result<()> {
        if self.durability_mode == DurabilityMode::None {
            return Ok(());
        }
        let serialized = rmp_serde::to_vec(entry).map_err(|e| {
            StoreError::Serialization(format!("Failed to serialize WAL entry: {}", e))
        })?;
        let len = u32::try_from(serialized.len())
            .map_err(|_| StoreError::Serialization("WAL entry exceeds 4 GiB".to_string()))?;

        let mut record = Vec::with_capacity(4 + serialized.len());
        record.extend_from_slice(&len.to_le_bytes());
        record.extend_from_slice(&serialized);

        if let Err(e) = self.write_record(&record) {
            self.roll_back();
            return Err(StoreError::io("Failed to write WAL", e));
        }
        self.committed_len += record.len() as u64;
        self.entries_since_checkpoint += 1;
        Ok(())
    }

    fn write_record(&mut self, record: &[u8]) -> std::io::Result<()> {
        #[cfg(test)]
        let injected_limit = self.fail_next_append_after.take();

        if self.wal_file.is_none() {
            // Closed by a failed roll-back: retry the cut before writing.
            let file = OpenOptions::new().append(true).open(&self.wal_path)?;
            file.set_len(self.committed_len)?;
            self.wal_file = Some(file);
        }
        let file = self
            .wal_file
            .as_mut()
            .ok_or_else(|| std::io::Error::other("WAL file is not open"))?;

        #[cfg(test)]
        if let Some(limit) = injected_limit {
            file.write_all(&record[..limit.min(record.len())])?;
            return Err(std::io::Error::other("injected WAL write failure"));
        }

        file.write_all(record)?;
        if self.durability_mode == DurabilityMode::Sync {
            file.sync_all()?;
        }
        Ok(())
    }

    fn roll_back(&mut self) {
        let Some(file) = self.wal_file.as_mut() else {
            return;
        };
        if let Err(e) = file.set_len(self.committed_len) {
            // Appending after a partial entry would hide every later write.
            error!(
                path = %self.wal_path.display(),
                error = %e,
                "could not cut back a partial WAL entry; log closed until the cut succeeds"
            );
            self.wal_file = None;
        }
    }

    #[cfg(test)]
    pub(crate) fn fail_next_append_after(&mut self, bytes: usize) {
        self.fail_next_append_after = Some(bytes);
    }

    /// Reads every complete entry. A torn final entry, left by a crash in the
    /// middle of an append, ends the replay instead of failing it.
    pub fn read_all(&self) -> Result<Vec<WalEntry>> {
        if !self.wal_path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.wal_path)
            .map_err(|e| StoreError::io("Failed to open WAL for reading", e))?;
        let mut reader = BufReader::new(file);
        let mut entries = Vec::new();
        loop {
            let mut len_bytes = [0u8; 4];
            match reader.read_exact(&mut len_bytes) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(StoreError::io("Failed to read WAL entry length", e)),
            }
            let len = u64::from(u32::from_le_bytes(len_bytes));
            // The prefix is untrusted: only allocate what is actually on disk.
            let mut data = Vec::new();
            reader
                .by_ref()
                .take(len)
                .read_to_end(&mut data)
                .map_err(|e| StoreError::io("Failed to read WAL entry data", e))?;
            if (data.len() as u64) < len {
                warn!(
                    path = %self.wal_path.display(),
                    complete_entries = entries.len(),
                    "ignoring torn WAL tail"
                );
                break;
            }
            let entry: WalEntry = rmp_serde::from_slice(&data).map_err(|e| {
                StoreError::Corrupted(format!(
                    "WAL entry {} could not be decoded: {}",
                    entries.len(),
                    e
                ))
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Whether the log file holds any bytes, complete entries or not.
    pub fn has_data(&self) -> Result<bool> {
        match fs::metadata(&self.wal_path) {
            Ok(meta) => Ok(meta.len() > 0),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io("Failed to stat WAL", e)),
        }
    }

    /// Empties the log in place. The open handle is kept on failure.
    pub fn clear(&mut self) -> Result<()> {
        if self.durability_mode == DurabilityMode::None {
            return Ok(());
        }
        let file = match self.wal_file.take() {
            Some(file) => file,
            None => open_for_append(&self.wal_path)?,
        };
        let file = self.wal_file.insert(file);
        file.set_len(0)
            .map_err(|e| StoreError::io("Failed to truncate WAL", e))?;
        self.committed_len = 0;
        if self.durability_mode == DurabilityMode::Sync {
            file.sync_all()
                .map_err(|e| StoreError::io("Failed to sync WAL", e))?;
        }
        self.entries_since_checkpoint = 0;
        Ok(())
    }

    pub fn needs_checkpoint(&self) -> bool {
        self.entries_since_checkpoint >= self.checkpoint_threshold
    }

    pub fn entries_since_checkpoint(&self) -> usize {
        self.entries_since_checkpoint
    }

    pub fn set_checkpoint_threshold(&mut self, threshold: usize) {
        self.checkpoint_threshold = threshold.max(1);
    }
}

fn open_for_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| StoreError::io("Failed to open WAL file", e))
}

// ============================================================================
// Snapshot Manager
// ============================================================================

pub struct SnapshotManager {
    snapshot_path: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    /// Writes into a temp file beside the target and renames it over, so a
    /// reader sees either the old snapshot or the new one.
    pub fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let parent = match self.snapshot_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)
            .map_err(|e| StoreError::io("Failed to create snapshot directory", e))?;

        let serialized = rmp_serde::to_vec(snapshot).map_err(|e| {
            StoreError::Serialization(format!("Failed to serialize snapshot: {}", e))
        })?;
        let mut temp = NamedTempFile::new_in(&parent)
            .map_err(|e| StoreError::io("Failed to create temp file", e))?;
        temp.write_all(&serialized)
            .map_err(|e| StoreError::io("Failed to write snapshot", e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| StoreError::io("Failed to sync snapshot", e))?;
        temp.persist(&self.snapshot_path)
            .map_err(|e| StoreError::io("Failed to rename snapshot", e.error))?;
        Ok(())
    }

    pub fn load(&self) -> Result<Option<StoreSnapshot>> {
        if !self.snapshot_path.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.snapshot_path)
            .map_err(|e| StoreError::io("Failed to read snapshot", e))?;
        let snapshot: StoreSnapshot = rmp_serde::from_slice(&data).map_err(|e| {
            StoreError::Corrupted(format!("Snapshot could not be decoded: {}", e))
        })?;
        if snapshot.version != SNAPSHOT_FORMAT_VERSION {
            return Err(StoreError::Corrupted(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }
        Ok(Some(snapshot))
    }

    pub fn exists(&self) -> bool {
        self.snapshot_path.exists()
    }
}

// ============================================================================
// Persistence Manager
// ============================================================================

pub struct PersistenceManager {
    wal: WalManager,
    snapshot: SnapshotManager,
    durability_mode: DurabilityMode,
}

impl PersistenceManager {
    pub fn new<P: AsRef<Path>>(data_dir: P, durability_mode: DurabilityMode) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let wal = WalManager::new(data_dir.join(WAL_FILE_NAME), durability_mode)?;
        let snapshot = SnapshotManager::new(data_dir.join(SNAPSHOT_FILE_NAME));
        Ok(Self {
            wal,
            snapshot,
            durability_mode,
        })
    }

    pub fn log(&mut self, entry: &WalEntry) -> Result<()> {
        self.wal.append(entry)
    }

    pub fn checkpoint(&mut self, table: &EmployeeTable) -> Result<()> {
        if self.durability_mode == DurabilityMode::None {
            return Ok(());
        }
        let snapshot = StoreSnapshot::new(table.clone());
        self.snapshot.save(&snapshot)?;
        self.wal.clear()?;
        info!(rows = snapshot.metadata.row_count, "checkpoint written");
        Ok(())
    }

    pub fn needs_checkpoint(&self) -> bool {
        self.wal.needs_checkpoint()
    }

    /// Rebuilds the table from the last snapshot plus every logged entry.
    /// Returns the table and the number of WAL entries replayed.
    pub fn recover(&self) -> Result<(EmployeeTable, usize)> {
        let mut table = match self.snapshot.load()? {
            Some(snapshot) => snapshot.table,
            None => EmployeeTable::new(),
        };

        let entries = self.wal.read_all()?;
        let replayed = entries.len();
        for entry in entries {
            entry.apply(&mut table);
        }
        Ok((table, replayed))
    }

    pub fn wal(&self) -> &WalManager {
        &self.wal
    }

    pub fn wal_mut(&mut self) -> &mut WalManager {
        &mut self.wal
    }

    pub fn snapshot(&self) -> &SnapshotManager {
        &self.snapshot
    }
}
