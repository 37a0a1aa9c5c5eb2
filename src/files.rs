use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::{DriveError, Result};
use crate::object_store::{ObjectStore, Progress};
use crate::storage::models::{file_type_from_name, FilePatch, FileQuery, FileRecord, Patch};
use crate::storage::RecordStore;

/// A file as handed over by the uploader.
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub name: String,
    pub data: Bytes,
    pub parent_folder_id: Option<String>,
    /// Last-modified time reported by the uploader, if any
    pub modified_at: Option<DateTime<Utc>>,
}

/// Field-level edits of an existing file.
#[derive(Debug, Clone, Default)]
pub struct FileEdit {
    pub name: Option<String>,
    pub parent_folder_id: Patch<String>,
}

/// Blob key for a file id.
pub fn storage_path(id: &str) -> String {
    format!("file/{id}")
}

#[derive(Clone)]
pub struct FileService {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn ObjectStore>,
    max_upload_size: u64,
}

impl FileService {
    pub fn new(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn ObjectStore>,
        max_upload_size: u64,
    ) -> Self {
        Self {
            records,
            blobs,
            max_upload_size,
        }
    }

    /// Validate, upload the blob, then create the record.
    pub async fn upload(
        &self,
        owner_email: &str,
        upload: NewUpload,
        progress: Progress<'_>,
    ) -> Result<FileRecord> {
        let name = upload.name.trim();
        if name.is_empty() {
            return Err(DriveError::Validation("file name must not be empty".into()));
        }
        let size = upload.data.len() as u64;
        if size > self.max_upload_size {
            return Err(DriveError::Validation(format!(
                "File is too large: {size} bytes exceeds the limit of {} bytes",
                self.max_upload_size
            )));
        }
        if let Some(ref folder_id) = upload.parent_folder_id {
            self.require_folder(owner_email, folder_id).await?;
        }

        let id = uuid::Uuid::new_v4().to_string();
        let path = storage_path(&id);
        let now = Utc::now();

        // Phase 1: bytes to the blob store
        let blob_ref = self.blobs.upload(&path, upload.data, progress).await?;

        // Phase 2: the record that makes the blob visible
        let record = FileRecord {
            id: id.clone(),
            name: name.to_string(),
            size,
            file_type: file_type_from_name(name),
            owner_email: owner_email.to_string(),
            storage_path: path.clone(),
            blob_ref,
            created_at: now,
            modified_at: Some(upload.modified_at.unwrap_or(now)),
            parent_folder_id: upload.parent_folder_id,
            is_favorite: false,
            is_in_trash: false,
            trashed_at: None,
        };

        if let Err(e) = self.records.create_file(&record).await {
            // Best-effort cleanup of the uploaded blob
            if let Err(cleanup) = self.blobs.delete(&path).await {
                tracing::warn!(file_id = %id, error = %cleanup, "Failed to remove orphaned blob");
            }
            return Err(e.into());
        }

        tracing::debug!(file_id = %id, size, "Uploaded file");
        Ok(record)
    }

    /// Fetch a file owned by `owner_email`. Other owners' files read as missing.
    pub async fn get_owned(&self, owner_email: &str, id: &str) -> Result<FileRecord> {
        match self.records.get_file(id).await? {
            Some(file) if file.owner_email == owner_email => Ok(file),
            _ => Err(DriveError::file_not_found(id)),
        }
    }

    /// Rename and/or move a file. Refreshes `modified_at`.
    pub async fn edit(&self, owner_email: &str, id: &str, edit: FileEdit) -> Result<FileRecord> {
        self.get_owned(owner_email, id).await?;

        if let Some(ref name) = edit.name {
            if name.trim().is_empty() {
                return Err(DriveError::Validation("file name must not be empty".into()));
            }
        }
        if let Patch::Value(ref folder_id) = edit.parent_folder_id {
            self.require_folder(owner_email, folder_id).await?;
        }

        let patch = FilePatch {
            name: edit.name.map(|n| n.trim().to_string()),
            parent_folder_id: edit.parent_folder_id,
            modified_at: Patch::Value(Utc::now()),
            ..Default::default()
        };
        let file = self.records.patch_file(id, &patch).await?;

        tracing::debug!(file_id = %id, "Edited file");
        Ok(file)
    }

    async fn require_folder(&self, owner_email: &str, folder_id: &str) -> Result<()> {
        match self.records.get_folder(folder_id).await? {
            Some(folder) if folder.owner_email == owner_email => Ok(()),
            _ => Err(DriveError::folder_not_found(folder_id)),
        }
    }

    /// File bytes, for download and preview.
    pub async fn content(&self, owner_email: &str, id: &str) -> Result<(FileRecord, Bytes)> {
        let file = self.get_owned(owner_email, id).await?;
        let data = self.blobs.get(&file.storage_path).await?;
        Ok((file, data))
    }

    /// Active files of the owner, optionally restricted to one folder.
    pub async fn list_active(
        &self,
        owner_email: &str,
        folder_id: Option<&str>,
    ) -> Result<Vec<FileRecord>> {
        let mut query = FileQuery::owned_by(owner_email).trashed(false);
        if let Some(folder_id) = folder_id {
            query.parent_folder_id = Some(Some(folder_id.to_string()));
        }
        Ok(self.records.query_files(&query).await?)
    }

    /// Trashed files of the owner, most recently trashed first.
    pub async fn list_trash(&self, owner_email: &str) -> Result<Vec<FileRecord>> {
        let query = FileQuery::owned_by(owner_email).trashed(true);
        let mut files = self.records.query_files(&query).await?;
        files.sort_by(|a, b| b.trashed_at.cmp(&a.trashed_at));
        Ok(files)
    }

    /// Every file of the owner in any state, for analytics.
    pub async fn list_all(&self, owner_email: &str) -> Result<Vec<FileRecord>> {
        Ok(self
            .records
            .query_files(&FileQuery::owned_by(owner_email))
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_store::no_progress;
    use crate::testutil::{test_services, OWNER};
    use std::sync::Mutex;

    fn upload_of(name: &str, size: usize) -> NewUpload {
        NewUpload {
            name: name.to_string(),
            data: Bytes::from(vec![7u8; size]),
            parent_folder_id: None,
            modified_at: None,
        }
    }

    #[tokio::test]
    async fn progress_is_reported_to_completion() {
        let dir = tempfile::tempdir().unwrap();
        let services = test_services(&dir);
        let seen = Mutex::new(Vec::new());
        let report = |p: u8| seen.lock().unwrap().push(p);

        services
            .files
            .upload(OWNER, upload_of("big.bin", 300 * 1024), &report)
            .await
            .unwrap();

        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn other_owners_files_read_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let services = test_services(&dir);
        let file = services
            .files
            .upload(OWNER, upload_of("mine.txt", 10), &no_progress)
            .await
            .unwrap();

        let err = services
            .files
            .get_owned("someone@else.com", &file.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DriveError::NotFound(_)));
    }

    #[tokio::test]
    async fn edit_renames_and_moves() {
        let dir = tempfile::tempdir().unwrap();
        let services = test_services(&dir);
        let folder = services
            .folders
            .create_folder(OWNER, "Reports", None)
            .await
            .unwrap();
        let file = services
            .files
            .upload(OWNER, upload_of("draft.txt", 10), &no_progress)
            .await
            .unwrap();

        let edited = services
            .files
            .edit(
                OWNER,
                &file.id,
                FileEdit {
                    name: Some("final.txt".to_string()),
                    parent_folder_id: Patch::Value(folder.id.clone()),
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.name, "final.txt");
        assert_eq!(edited.parent_folder_id.as_deref(), Some(folder.id.as_str()));
        // type is fixed at upload
        assert_eq!(edited.file_type, "txt");

        let in_folder = services
            .files
            .list_active(OWNER, Some(&folder.id))
            .await
            .unwrap();
        assert_eq!(in_folder.len(), 1);
    }

    #[tokio::test]
    async fn upload_into_missing_folder_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let services = test_services(&dir);
        let mut upload = upload_of("a.txt", 1);
        upload.parent_folder_id = Some("nope".to_string());

        let err = services
            .files
            .upload(OWNER, upload, &no_progress)
            .await
            .unwrap_err();
        assert!(matches!(err, DriveError::NotFound(_)));
    }
}
