//! drive - A personal file manager service
//!
//! This crate provides folders, uploads, favorites and a trash lifecycle with:
//! - Swappable blob storage backends (local filesystem, GCS)
//! - redb embedded database for file and folder records
//! - Concurrent batch trash/restore/purge over a selection
//! - REST API with multipart upload, previews and storage analytics

pub mod analytics;
pub mod api;
pub mod batch;
pub mod config;
pub mod error;
pub mod files;
pub mod folders;
pub mod lifecycle;
pub mod object_store;
pub mod preview;
pub mod session;
pub mod storage;
#[cfg(test)]
pub mod testutil;
pub mod view;
pub mod workspace;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use batch::BatchCoordinator;
use config::Config;
use files::FileService;
use folders::FolderService;
use lifecycle::TrashLifecycle;
use object_store::ObjectStore;
use storage::RecordStore;
use workspace::Workspace;

/// The operations layer, wired over one record store and one blob store.
#[derive(Clone)]
pub struct Services {
    pub files: FileService,
    pub folders: FolderService,
    pub lifecycle: TrashLifecycle,
    pub batch: BatchCoordinator,
}

impl Services {
    pub fn new(
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn ObjectStore>,
        max_upload_size: u64,
    ) -> Self {
        let lifecycle = TrashLifecycle::new(Arc::clone(&records), Arc::clone(&blobs));
        Self {
            files: FileService::new(Arc::clone(&records), Arc::clone(&blobs), max_upload_size),
            folders: FolderService::new(records, lifecycle.clone()),
            batch: BatchCoordinator::new(lifecycle.clone()),
            lifecycle,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub services: Services,
    pub object_store: Arc<dyn ObjectStore>,
    /// Session workspaces keyed by user email
    pub workspaces: Mutex<HashMap<String, Arc<Mutex<Workspace>>>>,
}

impl AppState {
    pub fn new(
        config: Config,
        records: Arc<dyn RecordStore>,
        object_store: Arc<dyn ObjectStore>,
    ) -> Self {
        let services = Services::new(
            records,
            Arc::clone(&object_store),
            config.max_upload_size,
        );
        Self {
            config,
            services,
            object_store,
            workspaces: Mutex::new(HashMap::new()),
        }
    }

    /// The workspace of a session, created on first use.
    pub async fn workspace(&self, email: &str) -> Arc<Mutex<Workspace>> {
        let mut workspaces = self.workspaces.lock().await;
        Arc::clone(workspaces.entry(email.to_string()).or_default())
    }

    /// Discard a session's workspace. Returns whether one existed.
    pub async fn end_session(&self, email: &str) -> bool {
        self.workspaces.lock().await.remove(email).is_some()
    }
}
