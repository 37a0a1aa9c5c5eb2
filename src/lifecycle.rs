//! Trash lifecycle of file records.
//!
//! ```text
//!   Active --move_to_trash--> Trashed --purge--> (gone)
//!      ^                         |
//!      +--------restore----------+
//! ```
//!
//! Favorites are an attribute of active files and are not a lifecycle transition.

use std::sync::Arc;

use chrono::Utc;

use crate::error::{DriveError, Result};
use crate::object_store::ObjectStore;
use crate::storage::models::{FilePatch, FileRecord, LifecycleState, Patch};
use crate::storage::RecordStore;

#[derive(Clone)]
pub struct TrashLifecycle {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn ObjectStore>,
}

impl TrashLifecycle {
    pub fn new(records: Arc<dyn RecordStore>, blobs: Arc<dyn ObjectStore>) -> Self {
        Self { records, blobs }
    }

    /// Active -> Trashed. The blob is left in place.
    pub async fn move_to_trash(&self, file: &FileRecord) -> Result<FileRecord> {
        require(file, LifecycleState::Active, "trash")?;

        let patch = FilePatch {
            is_in_trash: Some(true),
            trashed_at: Patch::Value(Utc::now()),
            ..Default::default()
        };
        let updated = self.records.patch_file(&file.id, &patch).await?;

        tracing::debug!(file_id = %file.id, "Moved file to trash");
        Ok(updated)
    }

    /// Trashed -> Active.
    pub async fn restore(&self, file: &FileRecord) -> Result<FileRecord> {
        require(file, LifecycleState::Trashed, "restore")?;

        let patch = FilePatch {
            is_in_trash: Some(false),
            trashed_at: Patch::Null,
            ..Default::default()
        };
        let updated = self.records.patch_file(&file.id, &patch).await?;

        tracing::debug!(file_id = %file.id, "Restored file from trash");
        Ok(updated)
    }

    /// Trashed -> purged: blob first, then the record.
    pub async fn purge(&self, file: &FileRecord) -> Result<()> {
        require(file, LifecycleState::Trashed, "purge")?;
        self.purge_unchecked(file).await
    }

    /// Purge regardless of trash state; used by folder cascades.
    ///
    /// If the blob delete fails the record is kept. If the record delete fails after the
    /// blob is gone, the record is left dangling with nothing to fetch.
    pub async fn purge_unchecked(&self, file: &FileRecord) -> Result<()> {
        self.blobs.delete(&file.storage_path).await?;

        if let Err(e) = self.records.delete_file(&file.id).await {
            tracing::warn!(
                file_id = %file.id,
                storage_path = %file.storage_path,
                error = %e,
                "Blob deleted but record delete failed; record now has no content"
            );
            return Err(e.into());
        }

        tracing::debug!(file_id = %file.id, "Purged file");
        Ok(())
    }

    /// Flip the favorite flag of an active file. State is checked against the stored
    /// record, since callers may hold a copy from before a trash.
    pub async fn toggle_favorite(&self, file: &FileRecord) -> Result<FileRecord> {
        let current = self.load(&file.id).await?;
        require(&current, LifecycleState::Active, "favorite")?;

        let patch = FilePatch {
            is_favorite: Some(!current.is_favorite),
            ..Default::default()
        };
        Ok(self.records.patch_file(&file.id, &patch).await?)
    }

    /// Load a record by id, mapping absence to `NotFound`.
    pub async fn load(&self, id: &str) -> Result<FileRecord> {
        self.records
            .get_file(id)
            .await?
            .ok_or_else(|| DriveError::file_not_found(id))
    }
}

fn require(file: &FileRecord, expected: LifecycleState, action: &'static str) -> Result<()> {
    let state = file.state();
    if state != expected {
        return Err(DriveError::InvalidTransition { action, state });
    }
    Ok(())
}
