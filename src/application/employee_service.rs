use std::sync::Arc;

use crate::{
    application::errors::ServiceError,
    core::{Employee, EmployeeId},
    storage::EmployeeStore,
};

/// Entry point for the HTTP layer. Each call goes straight to the configured
/// store; a missing record comes back as `None`, never as an error.
#[derive(Clone)]
pub struct EmployeeService {
    store: Arc<dyn EmployeeStore>,
}

impl EmployeeService {
    pub fn new(store: Arc<dyn EmployeeStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, employee: Employee) -> Result<Employee, ServiceError> {
        Ok(self.store.create(employee).await?)
    }

    /// Stores `employee` under `id` as-is. The body's own id is not compared
    /// with `id`.
    pub async fn update(
        &self,
        employee: Employee,
        id: EmployeeId,
    ) -> Result<Employee, ServiceError> {
        Ok(self.store.update(employee, id).await?)
    }

    pub async fn read(&self, id: EmployeeId) -> Result<Option<Employee>, ServiceError> {
        Ok(self.store.read(id).await?)
    }

    pub async fn read_all(&self) -> Result<Vec<Employee>, ServiceError> {
        Ok(self.store.read_all().await?)
    }

    pub async fn delete(&self, id: EmployeeId) -> Result<(), ServiceError> {
        Ok(self.store.delete(id).await?)
    }
}
