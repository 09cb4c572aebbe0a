use agenda_core::CoreError;
use thiserror::Error;

/// Errors that can occur within the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The date and time could not be combined into a local instant.
    #[error("Invalid date/time: {0}")]
    InvalidDateTime(String),

    /// No item with the given ID exists in the store.
    #[error("Item not found: {id}")]
    ItemNotFound { id: i64 },
}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ItemNotFound { id } => CoreError::ItemNotFound { id },
            other => CoreError::Database(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
