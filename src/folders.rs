use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::error::{DriveError, Result};
use crate::lifecycle::TrashLifecycle;
use crate::storage::models::{FileQuery, FolderQuery, FolderRecord};
use crate::storage::RecordStore;

/// Counts of what a cascade delete removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CascadeStats {
    pub folders: u64,
    pub files: u64,
}

#[derive(Clone)]
pub struct FolderService {
    records: Arc<dyn RecordStore>,
    lifecycle: TrashLifecycle,
}

impl FolderService {
    pub fn new(records: Arc<dyn RecordStore>, lifecycle: TrashLifecycle) -> Self {
        Self { records, lifecycle }
    }

    pub async fn create_folder(
        &self,
        owner_email: &str,
        name: &str,
        parent_folder_id: Option<&str>,
    ) -> Result<FolderRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DriveError::Validation(
                "folder name must not be empty".to_string(),
            ));
        }
        if let Some(parent) = parent_folder_id {
            self.get_owned(owner_email, parent).await?;
        }

        let folder = FolderRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            owner_email: owner_email.to_string(),
            parent_folder_id: parent_folder_id.map(str::to_string),
            created_at: Utc::now(),
        };
        self.records.create_folder(&folder).await?;

        tracing::debug!(folder_id = %folder.id, "Created folder");
        Ok(folder)
    }

    pub async fn get_folder(&self, id: &str) -> Result<FolderRecord> {
        self.records
            .get_folder(id)
            .await?
            .ok_or_else(|| DriveError::folder_not_found(id))
    }

    /// A folder of `owner_email`. Other owners' folders read as missing.
    pub async fn get_owned(&self, owner_email: &str, id: &str) -> Result<FolderRecord> {
        let folder = self.get_folder(id).await?;
        if folder.owner_email != owner_email {
            return Err(DriveError::folder_not_found(id));
        }
        Ok(folder)
    }

    /// Folders of `owner_email` directly under `parent_folder_id` (root when `None`).
    pub async fn list_folders(
        &self,
        owner_email: &str,
        parent_folder_id: Option<&str>,
    ) -> Result<Vec<FolderRecord>> {
        let query = FolderQuery {
            owner_email: Some(owner_email.to_string()),
            parent_folder_id: Some(parent_folder_id.map(str::to_string)),
        };
        let mut folders = self.records.query_folders(&query).await?;
        folders.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(folders)
    }

    /// Number of folders `owner_email` has at any depth.
    pub async fn count_owned(&self, owner_email: &str) -> Result<u64> {
        let query = FolderQuery {
            owner_email: Some(owner_email.to_string()),
            parent_folder_id: None,
        };
        Ok(self.records.query_folders(&query).await?.len() as u64)
    }

    /// Delete a folder, its subfolders and every file inside them.
    ///
    /// Children go before their parent, so a failure part-way leaves at most an
    /// ancestor whose children are already gone. Nothing deleted is restored.
    pub async fn delete_cascade(&self, folder_id: &str) -> Result<CascadeStats> {
        self.get_folder(folder_id).await?;

        let mut stats = CascadeStats::default();
        let mut visited = HashSet::new();
        let result = self
            .delete_recursive(folder_id.to_string(), &mut visited, &mut stats)
            .await;
        if let Err(e) = result {
            tracing::error!(
                folder_id = %folder_id,
                folders_deleted = stats.folders,
                files_deleted = stats.files,
                error = %e,
                "Folder delete aborted part-way"
            );
            return Err(e);
        }

        tracing::info!(
            folder_id = %folder_id,
            folders = stats.folders,
            files = stats.files,
            "Deleted folder and contents"
        );
        Ok(stats)
    }

    fn delete_recursive<'a>(
        &'a self,
        folder_id: String,
        visited: &'a mut HashSet<String>,
        stats: &'a mut CascadeStats,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            // Parent links are not checked for cycles on write
            if !visited.insert(folder_id.clone()) {
                return Ok(());
            }

            let children = self
                .records
                .query_folders(&FolderQuery::children_of(&folder_id))
                .await?;
            for child in children {
                self.delete_recursive(child.id, visited, stats).await?;
            }

            let files = self
                .records
                .query_files(&FileQuery::in_folder(&folder_id))
                .await?;
            for file in files {
                self.lifecycle.purge_unchecked(&file).await?;
                stats.files += 1;
            }

            self.records.delete_folder(&folder_id).await?;
            stats.folders += 1;
            Ok(())
        })
    }
}
