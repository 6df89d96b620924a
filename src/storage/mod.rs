use async_trait::async_trait;

use crate::core::{Employee, EmployeeId, Result};

pub mod durable;
pub mod memory;
pub mod persistence;
pub mod table;

pub use durable::DurableEmployeeStore;
pub use memory::InMemoryEmployeeStore;
pub use persistence::DurabilityMode;
pub use table::EmployeeTable;

/// Authoritative keyed storage for employee records.
///
/// Every method is atomic with respect to concurrent callers. A missing key is
/// never an error: `read` reports it as `None` and `delete` ignores it.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Stores `employee` under its embedded id (or a generated one when the
    /// id is absent). Overwrites an existing row.
    async fn create(&self, employee: Employee) -> Result<Employee>;

    /// Stores `employee` under `id`. The embedded id is not checked against
    /// `id`; a missing key becomes an insert.
    async fn update(&self, employee: Employee, id: EmployeeId) -> Result<Employee>;

    async fn read(&self, id: EmployeeId) -> Result<Option<Employee>>;

    /// All stored rows in no particular order.
    async fn read_all(&self) -> Result<Vec<Employee>>;

    async fn delete(&self, id: EmployeeId) -> Result<()>;
}
