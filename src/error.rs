use thiserror::Error;

use crate::object_store::ObjectStoreError;
use crate::storage::models::LifecycleState;
use crate::storage::RecordStoreError;

/// Errors surfaced by file and folder operations.
#[derive(Debug, Error)]
pub enum DriveError {
    /// Rejected before any backend call; not retried.
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("cannot {action} a file that is {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: LifecycleState,
    },
    #[error("Record store error: {0}")]
    Records(#[from] RecordStoreError),
    #[error("Blob store error: {0}")]
    Blobs(#[from] ObjectStoreError),
}

impl DriveError {
    pub fn file_not_found(id: &str) -> Self {
        DriveError::NotFound(format!("File '{id}'"))
    }

    pub fn folder_not_found(id: &str) -> Self {
        DriveError::NotFound(format!("Folder '{id}'"))
    }
}

pub type Result<T, E = DriveError> = std::result::Result<T, E>;
