pub mod employees_handler;
pub mod problem;
