//! Employee CRUD service.
//!
//! Requests flow from the axum router ([`app::build_router`]) through
//! [`application::employee_service::EmployeeService`] into an
//! [`storage::EmployeeStore`], which is either the volatile
//! [`storage::InMemoryEmployeeStore`] or the write-ahead-logged
//! [`storage::DurableEmployeeStore`].

pub mod app;
pub mod application;
pub mod config;
pub mod core;
pub mod interface;
pub mod state;
pub mod storage;

pub use app::build_router;
pub use crate::core::{Employee, EmployeeId, Result, StoreError};
