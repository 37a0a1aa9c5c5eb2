mod gcs;
mod local;

pub use gcs::GcsStore;
pub use local::LocalStore;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Upload progress callback, called with a percentage in `0..=100`.
pub type Progress<'a> = &'a (dyn Fn(u8) + Send + Sync);

/// Progress sink that discards every update.
pub fn no_progress(_: u8) {}

/// Abstraction over blob storage backends.
/// Keys are storage paths (`file/<uuid>`); the blobs are meaningless without the record store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `key` and return the URL the blob can be fetched from.
    async fn upload(
        &self,
        key: &str,
        data: Bytes,
        progress: Progress<'_>,
    ) -> Result<String, ObjectStoreError>;
    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError>;
    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError>;
    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError>;
}

/// Percentage of `done` out of `total`, treating an empty payload as complete.
pub(crate) fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done as u128 * 100) / total as u128).min(100) as u8
}
