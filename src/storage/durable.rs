use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::persistence::{DEFAULT_CHECKPOINT_THRESHOLD, PersistenceManager, WalEntry};
use super::{DurabilityMode, EmployeeStore, EmployeeTable};
use crate::core::{Employee, EmployeeId, Result, StoreError};

/// Durable store: the table lives in memory, every mutation is appended to
/// the write-ahead log before it is applied, and the log is folded into a
/// snapshot every `checkpoint_threshold` entries.
///
/// Writers hold the lock for the whole read-modify-write and run the file I/O
/// on the blocking pool, so an fsync never stalls a runtime worker.
pub struct DurableEmployeeStore {
    state: Arc<Mutex<DurableState>>,
}

struct DurableState {
    table: EmployeeTable,
    persistence: PersistenceManager,
}

impl DurableEmployeeStore {
    pub fn open<P: AsRef<Path>>(data_dir: P, durability_mode: DurabilityMode) -> Result<Self> {
        Self::open_with_threshold(data_dir, durability_mode, DEFAULT_CHECKPOINT_THRESHOLD)
    }

    /// Opens (or creates) the store in `data_dir` and recovers its contents.
    ///
    /// Any WAL content found on open, including a torn tail, is folded into a
    /// fresh snapshot so later appends start from a clean log.
    pub fn open_with_threshold<P: AsRef<Path>>(
        data_dir: P,
        durability_mode: DurabilityMode,
        checkpoint_threshold: usize,
    ) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let mut persistence = PersistenceManager::new(data_dir, durability_mode)?;
        persistence
            .wal_mut()
            .set_checkpoint_threshold(checkpoint_threshold);

        let (table, replayed) = persistence.recover()?;
        if persistence.wal().has_data()? {
            persistence.checkpoint(&table)?;
        }
        info!(
            data_dir = %data_dir.display(),
            rows = table.len(),
            replayed,
            ?durability_mode,
            "opened durable employee store"
        );

        Ok(Self {
            state: Arc::new(Mutex::new(DurableState { table, persistence })),
        })
    }

    /// Writes a snapshot of the current table and truncates the log.
    pub async fn checkpoint(&self) -> Result<()> {
        self.write(|state| {
            let DurableState { table, persistence } = state;
            persistence.checkpoint(table)
        })
        .await
    }

    async fn write<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut DurableState) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let mut state = Arc::clone(&self.state).lock_owned().await;
        tokio::task::spawn_blocking(move || op(&mut *state))
            .await
            .map_err(|e| StoreError::Lock(format!("durable store writer failed: {}", e)))?
    }
}

impl DurableState {
    fn append(&mut self, entry: WalEntry) -> Result<()> {
        self.persistence.log(&entry)?;
        entry.apply(&mut self.table);

        if self.persistence.needs_checkpoint() {
            // The entry is already durable in the log; a failed checkpoint is
            // retried on the next write.
            if let Err(err) = self.persistence.checkpoint(&self.table) {
                warn!(error = %err, "checkpoint failed");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EmployeeStore for DurableEmployeeStore {
    async fn create(&self, mut employee: Employee) -> Result<Employee> {
        self.write(move |state| {
            let key = state.table.key_for_create(&employee)?;
            employee.id.get_or_insert(key);

            state.append(WalEntry::Put {
                key,
                employee: employee.clone(),
            })?;
            debug!(employee_id = key, "created employee");
            Ok(employee)
        })
        .await
    }

    async fn update(&self, employee: Employee, id: EmployeeId) -> Result<Employee> {
        self.write(move |state| {
            state.append(WalEntry::Put {
                key: id,
                employee: employee.clone(),
            })?;
            debug!(employee_id = id, "stored employee");
            Ok(employee)
        })
        .await
    }

    async fn read(&self, id: EmployeeId) -> Result<Option<Employee>> {
        Ok(self.state.lock().await.table.get(id).cloned())
    }

    async fn read_all(&self) -> Result<Vec<Employee>> {
        Ok(self.state.lock().await.table.all())
    }

    async fn delete(&self, id: EmployeeId) -> Result<()> {
        self.write(move |state| {
            if state.table.get(id).is_none() {
                return Ok(());
            }
            state.append(WalEntry::Delete { key: id })?;
            debug!(employee_id = id, "deleted employee");
            Ok(())
        })
        .await
    }
}
