use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{EmployeeStore, EmployeeTable};
use crate::core::{Employee, EmployeeId, Result};

/// Volatile store: a process-local table behind an async read/write lock.
pub struct InMemoryEmployeeStore {
    table: RwLock<EmployeeTable>,
}

impl InMemoryEmployeeStore {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(EmployeeTable::new()),
        }
    }
}

impl Default for InMemoryEmployeeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmployeeStore for InMemoryEmployeeStore {
    async fn create(&self, mut employee: Employee) -> Result<Employee> {
        let mut table = self.table.write().await;
        let key = table.key_for_create(&employee)?;
        employee.id.get_or_insert(key);

        table.put(key, employee.clone());
        debug!(employee_id = key, "created employee");
        Ok(employee)
    }

    async fn update(&self, employee: Employee, id: EmployeeId) -> Result<Employee> {
        self.table.write().await.put(id, employee.clone());
        debug!(employee_id = id, "stored employee");
        Ok(employee)
    }

    async fn read(&self, id: EmployeeId) -> Result<Option<Employee>> {
        Ok(self.table.read().await.get(id).cloned())
    }

    async fn read_all(&self) -> Result<Vec<Employee>> {
        Ok(self.table.read().await.all())
    }

    async fn delete(&self, id: EmployeeId) -> Result<()> {
        if self.table.write().await.remove(id).is_some() {
            debug!(employee_id = id, "deleted employee");
        }
        Ok(())
    }
}
