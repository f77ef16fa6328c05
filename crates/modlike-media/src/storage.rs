use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Extensions accepted for event banner images.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Prefix under which stored paths are served by the HTTP layer.
const PUBLIC_PREFIX: &str = "uploads/";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported image type: {0} (allowed: jpg, jpeg, png)")]
    UnsupportedType(String),
    #[error("image too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Filesystem directory backing the public `uploads/` prefix.
    pub base_path: PathBuf,
    pub max_file_size: u64,
}

#[derive(Debug, Clone)]
pub struct StoredImage {
    /// Stable relative path recorded on the event, e.g.
    /// `uploads/events/9f6c….png`.
    pub public_path: String,
    pub size: u64,
}

/// Local filesystem store for event images. Files are renamed to a UUID
/// on write so uploads can never collide or traverse directories.
pub struct ImageStore {
    config: StorageConfig,
}

impl ImageStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    fn validated_extension(filename: &str) -> Result<String, StorageError> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default();
        if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            Ok(ext)
        } else {
            Err(StorageError::UnsupportedType(ext))
        }
    }

    /// Store an uploaded image and return its public path.
    pub async fn store_image(
        &self,
        filename: &str,
        data: &[u8],
    ) -> Result<StoredImage, StorageError> {
        let ext = Self::validated_extension(filename)?;
        let size = data.len() as u64;
        if size > self.config.max_file_size {
            return Err(StorageError::TooLarge {
                size,
                limit: self.config.max_file_size,
            });
        }

        let dir = self.config.base_path.join("events");
        fs::create_dir_all(&dir).await?;

        let stored_name = format!("{}.{}", Uuid::new_v4(), ext);
        let path = dir.join(&stored_name);
        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        tracing::debug!(path = %path.display(), size, "stored image");
        Ok(StoredImage {
            public_path: format!("{PUBLIC_PREFIX}events/{stored_name}"),
            size,
        })
    }

    /// Delete a previously stored image by its public path. Missing files
    /// and paths outside the store are a no-op.
    pub async fn delete(&self, public_path: &str) -> Result<(), StorageError> {
        let Some(rel) = public_path.strip_prefix(PUBLIC_PREFIX) else {
            return Ok(());
        };
        if rel.contains("..") {
            return Ok(());
        }
        let path = self.config.base_path.join(rel);
        if path.exists() {
            fs::remove_file(&path).await?;
            tracing::debug!(path = %path.display(), "deleted image");
        }
        Ok(())
    }

    pub async fn exists(&self, public_path: &str) -> bool {
        public_path
            .strip_prefix(PUBLIC_PREFIX)
            .map(|rel| self.config.base_path.join(rel).exists())
            .unwrap_or(false)
    }
}
