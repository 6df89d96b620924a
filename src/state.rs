use std::sync::Arc;

use crate::application::employee_service::EmployeeService;

#[derive(Clone)]
pub struct AppState {
    pub employee_service: Arc<EmployeeService>,
}

impl AppState {
    pub fn new(employee_service: Arc<EmployeeService>) -> Self {
        Self { employee_service }
    }
}
