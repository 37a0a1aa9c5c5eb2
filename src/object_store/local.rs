use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;

use super::{percent, ObjectStore, ObjectStoreError, Progress};

const CHUNK_SIZE: usize = 64 * 1024;

/// Local filesystem object store for development and testing.
pub struct LocalStore {
    base_path: PathBuf,
    /// Prefix for blob URLs, e.g. `http://localhost:8080/blobs`
    public_url: String,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(base_path: P, public_url: &str) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self {
            base_path,
            public_url: public_url.trim_end_matches('/').to_string(),
        })
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, ObjectStoreError> {
        let relative = Path::new(key);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(ObjectStoreError::NotFound(key.to_string()));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn upload(
        &self,
        key: &str,
        data: Bytes,
        progress: Progress<'_>,
    ) -> Result<String, ObjectStoreError> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        progress(0);
        let mut file = tokio::fs::File::create(&path).await?;
        let mut written = 0;
        for chunk in data.chunks(CHUNK_SIZE) {
            file.write_all(chunk).await?;
            written += chunk.len();
            progress(percent(written, data.len()));
        }
        file.flush().await?;
        if data.is_empty() {
            progress(100);
        }

        Ok(format!("{}/{}", self.public_url, key))
    }

    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError> {
        let path = self.object_path(key)?;
        if !path.exists() {
            return Err(ObjectStoreError::NotFound(key.to_string()));
        }
        let data = tokio::fs::read(&path).await?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        let path = self.object_path(key)?;
        if path.exists() {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
        let path = self.object_path(key)?;
        Ok(path.exists())
    }
}
