use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupted storage: {0}")]
    Corrupted(String),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("No identifiers left to assign; supply an explicit id")]
    KeysExhausted,
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn io(context: &str, err: std::io::Error) -> Self {
        Self::Io(format!("{}: {}", context, err))
    }
}
