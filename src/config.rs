use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Default upload ceiling in bytes
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 1_000_000;
/// Default per-user storage quota (15 GiB)
pub const DEFAULT_STORAGE_QUOTA: u64 = 15 * 1024 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub node: NodeConfig,
    pub storage: StorageConfig,
    /// Maximum upload size in bytes
    pub max_upload_size: u64,
    /// Quota shown against usage in storage analytics
    pub storage_quota: u64,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_address: String,
    pub data_dir: String,
    /// Externally reachable base URL, used to build local blob URLs
    pub public_base_url: String,
}

#[derive(Debug, Clone)]
pub enum StorageBackend {
    Gcs,
    Local,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for local storage backend
    pub local_storage_path: String,
    /// GCS bucket name (required when backend is gcs)
    pub gcs_bucket: Option<String>,
    /// Path to GCS service account JSON (optional, defaults to ADC)
    pub gcs_credentials_file: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            local_storage_path: "./files".to_string(),
            gcs_bucket: None,
            gcs_credentials_file: None,
        }
    }
}

impl NodeConfig {
    /// Prefix under which the local backend's blobs are served.
    pub fn blob_url_prefix(&self) -> String {
        format!("{}/blobs", self.public_base_url.trim_end_matches('/'))
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string());

        let max_upload_size = std::env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE);

        let storage_quota = std::env::var("STORAGE_QUOTA")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_STORAGE_QUOTA);

        let storage_backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "gcs" => StorageBackend::Gcs,
            _ => StorageBackend::Local,
        };

        let local_storage_path =
            std::env::var("LOCAL_STORAGE_PATH").unwrap_or_else(|_| "./files".to_string());

        let gcs_bucket = std::env::var("GCS_BUCKET").ok();
        let gcs_credentials_file = std::env::var("GCS_CREDENTIALS_FILE").ok();

        let config = Config {
            node: NodeConfig {
                bind_address,
                data_dir,
                public_base_url,
            },
            storage: StorageConfig {
                backend: storage_backend,
                local_storage_path,
                gcs_bucket,
                gcs_credentials_file,
            },
            max_upload_size,
            storage_quota,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if matches!(self.storage.backend, StorageBackend::Gcs) && self.storage.gcs_bucket.is_none()
        {
            return Err(ConfigError::ValidationError(
                "GCS_BUCKET is required when STORAGE_BACKEND=gcs".to_string(),
            ));
        }

        if self.max_upload_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_SIZE must be greater than 0".to_string(),
            ));
        }

        if !self.node.public_base_url.starts_with("http://")
            && !self.node.public_base_url.starts_with("https://")
        {
            return Err(ConfigError::ValidationError(
                "PUBLIC_BASE_URL must be an http(s) URL".to_string(),
            ));
        }

        if self.storage_quota < self.max_upload_size {
            tracing::warn!(
                "STORAGE_QUOTA ({}) is smaller than MAX_UPLOAD_SIZE ({}); usage will read over 100%",
                self.storage_quota,
                self.max_upload_size
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config {
            node: NodeConfig {
                bind_address: "127.0.0.1:0".to_string(),
                data_dir: "./data".to_string(),
                public_base_url: "http://localhost:8080/".to_string(),
            },
            storage: StorageConfig::default(),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            storage_quota: DEFAULT_STORAGE_QUOTA,
        }
    }

    #[test]
    fn gcs_requires_bucket() {
        let mut config = base();
        config.storage.backend = StorageBackend::Gcs;
        assert!(config.validate().is_err());
        config.storage.gcs_bucket = Some("bucket".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn blob_prefix_trims_trailing_slash() {
        assert_eq!(base().node.blob_url_prefix(), "http://localhost:8080/blobs");
    }

    #[test]
    fn rejects_non_http_base_url() {
        let mut config = base();
        config.node.public_base_url = "localhost:8080".to_string();
        assert!(config.validate().is_err());
    }
}
