use serde::{Deserialize, Serialize};

use crate::{
    application::errors::ServiceError,
    core::{Employee, EmployeeId},
};

/// Body accepted by the create route. Fields are optional here so that a
/// missing value is reported as a validation failure rather than a decode
/// error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateEmployeeRequest {
    #[serde(default)]
    pub id: Option<EmployeeId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

impl CreateEmployeeRequest {
    pub fn into_employee(self) -> Result<Employee, ServiceError> {
        let name = required_text("name", self.name)?;
        let company = required_text("company", self.company)?;

        Ok(Employee {
            id: self.id,
            name,
            company,
        })
    }
}

fn required_text(field: &str, value: Option<String>) -> Result<String, ServiceError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(_) => Err(ServiceError::validation(format!("{field} must not be blank"))),
        None => Err(ServiceError::validation(format!("{field} is required"))),
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
