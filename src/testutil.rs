//! Shared test helpers for unit tests.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;

use crate::config::{Config, NodeConfig, StorageConfig};
use crate::files::storage_path;
use crate::object_store::{no_progress, LocalStore, ObjectStore};
use crate::storage::models::{file_type_from_name, FileRecord};
use crate::storage::Database;
use crate::{AppState, Services};

pub const OWNER: &str = "owner@example.com";
const BLOB_URL: &str = "http://localhost:8080/blobs";

/// Services over a temporary database and local blob directory, with direct handles
/// to both backends for seeding and inspection.
pub struct TestServices {
    pub db: Database,
    pub blobs: Arc<LocalStore>,
    pub services: Services,
}

impl std::ops::Deref for TestServices {
    type Target = Services;

    fn deref(&self) -> &Services {
        &self.services
    }
}

impl TestServices {
    /// Store a blob and the record pointing at it; returns the record as persisted.
    pub async fn seed_file(&self, file: FileRecord) -> FileRecord {
        self.blobs
            .upload(&file.storage_path, Bytes::from(vec![0u8; 4]), &no_progress)
            .await
            .expect("Failed to seed blob");
        self.db.put_file(&file).expect("Failed to seed record");
        self.db
            .get_file(&file.id)
            .expect("Failed to read seeded record")
            .expect("Seeded record missing")
    }
}

pub fn test_services(temp_dir: &tempfile::TempDir) -> TestServices {
    let db = Database::open(temp_dir.path().join("data")).expect("Failed to open test database");
    let blobs = Arc::new(
        LocalStore::new(temp_dir.path().join("files"), BLOB_URL)
            .expect("Failed to create test object store"),
    );
    let services = Services::new(Arc::new(db.clone()), blobs.clone(), 1_000_000);
    TestServices {
        db,
        blobs,
        services,
    }
}

/// Create a test AppState with a temporary database and local object store.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let data_dir = temp_dir.path().join("data");
    let files_dir = temp_dir.path().join("files");

    let config = Config {
        node: NodeConfig {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: data_dir.to_string_lossy().to_string(),
            public_base_url: "http://localhost:8080".to_string(),
        },
        storage: StorageConfig {
            local_storage_path: files_dir.to_string_lossy().to_string(),
            ..Default::default()
        },
        max_upload_size: 1_000_000,
        storage_quota: 15 * 1024 * 1024 * 1024,
    };

    let db = Database::open(&data_dir).expect("Failed to open test database");
    let object_store: Arc<dyn ObjectStore> = Arc::new(
        LocalStore::new(&files_dir, BLOB_URL).expect("Failed to create test object store"),
    );

    Arc::new(AppState::new(config, Arc::new(db), object_store))
}

/// An active record owned by [`OWNER`] at the root, with a blob path derived from its id.
pub fn sample_file(id: &str, name: &str) -> FileRecord {
    let now = Utc::now();
    let path = storage_path(id);
    FileRecord {
        id: id.to_string(),
        name: name.to_string(),
        size: 4,
        file_type: file_type_from_name(name),
        owner_email: OWNER.to_string(),
        blob_ref: format!("{BLOB_URL}/{path}"),
        storage_path: path,
        created_at: now,
        modified_at: Some(now),
        parent_folder_id: None,
        is_favorite: false,
        is_in_trash: false,
        trashed_at: None,
    }
}
