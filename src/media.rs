/// Object store for user media (avatars, cover images)
///
/// Handlers stage the uploaded bytes to a local file and hand the path to an
/// `ObjectStore`, which returns the public URL of the stored object.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::UploadError;

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedObject {
    pub url: String,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, local_path: &Path) -> Result<UploadedObject, UploadError>;
}

/// Stores objects in a directory on local disk, served under `public_url`
pub struct LocalObjectStore {
    root: PathBuf,
    public_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn upload(&self, local_path: &Path) -> Result<UploadedObject, UploadError> {
        let metadata = tokio::fs::metadata(local_path)
            .await
            .map_err(|_| UploadError::MissingFile(local_path.display().to_string()))?;
        if !metadata.is_file() || metadata.len() == 0 {
            return Err(UploadError::Rejected("empty or not a regular file".to_string()));
        }

        tokio::fs::create_dir_all(&self.root).await?;

        let object_name = match local_path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext.to_ascii_lowercase()),
            None => Uuid::new_v4().to_string(),
        };
        tokio::fs::copy(local_path, self.root.join(&object_name)).await?;

        let url = format!("{}/{}", self.public_url, object_name);
        tracing::info!(url = %url, "Object stored");
        Ok(UploadedObject { url })
    }
}

/// Write an upload body to `staging_dir` so it can be handed to an `ObjectStore`.
/// Only the extension of the client-supplied file name is kept.
pub async fn stage_upload(
    staging_dir: &Path,
    file_name: Option<&str>,
    bytes: &[u8],
) -> Result<PathBuf, UploadError> {
    tokio::fs::create_dir_all(staging_dir).await?;

    let extension = file_name
        .map(Path::new)
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .filter(|e| e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()));
    let staged_name = match extension {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    };

    let path = staging_dir.join(staged_name);
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}
