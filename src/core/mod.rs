pub mod employee;
pub mod error;

pub use employee::{Employee, EmployeeId};
pub use error::{Result, StoreError};
