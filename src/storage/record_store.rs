use async_trait::async_trait;
use thiserror::Error;

use super::db::{Database, DatabaseError};
use super::models::{FilePatch, FileQuery, FileRecord, FolderQuery, FolderRecord};

#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Abstraction over the document collections holding file and folder records.
/// Queries are conjunctions of equality predicates and return a snapshot.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn create_file(&self, file: &FileRecord) -> Result<(), RecordStoreError>;
    async fn get_file(&self, id: &str) -> Result<Option<FileRecord>, RecordStoreError>;
    async fn patch_file(&self, id: &str, patch: &FilePatch)
        -> Result<FileRecord, RecordStoreError>;
    async fn delete_file(&self, id: &str) -> Result<bool, RecordStoreError>;
    async fn query_files(&self, query: &FileQuery) -> Result<Vec<FileRecord>, RecordStoreError>;

    async fn create_folder(&self, folder: &FolderRecord) -> Result<(), RecordStoreError>;
    async fn get_folder(&self, id: &str) -> Result<Option<FolderRecord>, RecordStoreError>;
    async fn delete_folder(&self, id: &str) -> Result<bool, RecordStoreError>;
    async fn query_folders(
        &self,
        query: &FolderQuery,
    ) -> Result<Vec<FolderRecord>, RecordStoreError>;
}

#[async_trait]
impl RecordStore for Database {
    async fn create_file(&self, file: &FileRecord) -> Result<(), RecordStoreError> {
        Ok(self.put_file(file)?)
    }

    async fn get_file(&self, id: &str) -> Result<Option<FileRecord>, RecordStoreError> {
        Ok(Database::get_file(self, id)?)
    }

    async fn patch_file(
        &self,
        id: &str,
        patch: &FilePatch,
    ) -> Result<FileRecord, RecordStoreError> {
        self.update_file(id, patch)?
            .ok_or_else(|| RecordStoreError::NotFound(id.to_string()))
    }

    async fn delete_file(&self, id: &str) -> Result<bool, RecordStoreError> {
        Ok(Database::delete_file(self, id)?)
    }

    async fn query_files(&self, query: &FileQuery) -> Result<Vec<FileRecord>, RecordStoreError> {
        Ok(Database::query_files(self, query)?)
    }

    async fn create_folder(&self, folder: &FolderRecord) -> Result<(), RecordStoreError> {
        Ok(self.put_folder(folder)?)
    }

    async fn get_folder(&self, id: &str) -> Result<Option<FolderRecord>, RecordStoreError> {
        Ok(Database::get_folder(self, id)?)
    }

    async fn delete_folder(&self, id: &str) -> Result<bool, RecordStoreError> {
        Ok(Database::delete_folder(self, id)?)
    }

    async fn query_folders(
        &self,
        query: &FolderQuery,
    ) -> Result<Vec<FolderRecord>, RecordStoreError> {
        Ok(Database::query_folders(self, query)?)
    }
}
