use bytes::Bytes;
use drive::object_store::{no_progress, LocalStore, ObjectStore, ObjectStoreError};
use std::sync::Mutex;

const BLOB_URL: &str = "http://localhost:8080/blobs";

#[tokio::test]
async fn test_local_store_upload_get() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path(), BLOB_URL).unwrap();

    let data = Bytes::from("hello world");
    let url = store
        .upload("file/abc", data.clone(), &no_progress)
        .await
        .unwrap();
    assert_eq!(url, "http://localhost:8080/blobs/file/abc");

    let retrieved = store.get("file/abc").await.unwrap();
    assert_eq!(retrieved, data);
}

#[tokio::test]
async fn test_local_store_trims_trailing_slash_from_url() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path(), "http://localhost:8080/blobs/").unwrap();

    let url = store
        .upload("k", Bytes::from("x"), &no_progress)
        .await
        .unwrap();
    assert_eq!(url, "http://localhost:8080/blobs/k");
}

#[tokio::test]
async fn test_local_store_reports_progress() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path(), BLOB_URL).unwrap();

    let seen = Mutex::new(Vec::new());
    let report = |p: u8| seen.lock().unwrap().push(p);
    store
        .upload("big", Bytes::from(vec![0u8; 200 * 1024]), &report)
        .await
        .unwrap();

    let seen = seen.into_inner().unwrap();
    assert_eq!(seen.first(), Some(&0));
    assert_eq!(seen.last(), Some(&100));
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_local_store_exists() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path(), BLOB_URL).unwrap();

    assert!(!store.exists("missing").await.unwrap());

    store
        .upload("present", Bytes::from("data"), &no_progress)
        .await
        .unwrap();
    assert!(store.exists("present").await.unwrap());
}

#[tokio::test]
async fn test_local_store_delete() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path(), BLOB_URL).unwrap();

    store
        .upload("file/to-delete", Bytes::from("data"), &no_progress)
        .await
        .unwrap();
    assert!(store.exists("file/to-delete").await.unwrap());

    store.delete("file/to-delete").await.unwrap();
    assert!(!store.exists("file/to-delete").await.unwrap());
}

#[tokio::test]
async fn test_local_store_delete_nonexistent() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path(), BLOB_URL).unwrap();

    // Deleting a nonexistent key should not error
    store.delete("nonexistent").await.unwrap();
}

#[tokio::test]
async fn test_local_store_get_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path(), BLOB_URL).unwrap();

    let result = store.get("missing").await;
    assert!(matches!(result.unwrap_err(), ObjectStoreError::NotFound(_)));
}

#[tokio::test]
async fn test_local_store_rejects_path_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path().join("blobs"), BLOB_URL).unwrap();

    let result = store
        .upload("../escape", Bytes::from("data"), &no_progress)
        .await;
    assert!(result.is_err());
    assert!(!dir.path().join("escape").exists());

    assert!(matches!(
        store.get("/etc/passwd").await.unwrap_err(),
        ObjectStoreError::NotFound(_)
    ));
}
