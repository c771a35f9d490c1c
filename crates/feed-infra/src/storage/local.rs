//! Local filesystem image store.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use feed_core::ports::{ImageStore, ImageStoreError, ImageUpload};

/// Stores images under `<root>/<dir>` and hands out `<dir>/<file>` paths.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
    dir: String,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>, dir: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            dir: dir.into(),
        }
    }

    /// Resolve a stored path against the root. Only `<dir>/<file>` is
    /// accepted, so nothing outside the upload directory is ever addressed.
    pub fn resolve(&self, relative_path: &str) -> Result<PathBuf, ImageStoreError> {
        let invalid = || ImageStoreError::InvalidPath(relative_path.to_string());

        let file = Path::new(relative_path)
            .strip_prefix(&self.dir)
            .map_err(|_| invalid())?;
        let mut components = file.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(relative_path)),
            _ => Err(invalid()),
        }
    }
}

/// Keep ASCII alphanumerics, dots, dashes and underscores.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn store(&self, upload: ImageUpload) -> Result<String, ImageStoreError> {
        let file_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(&upload.file_name));
        let relative = format!("{}/{}", self.dir.trim_end_matches('/'), file_name);
        let target = self.resolve(&relative)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &upload.bytes).await?;

        tracing::debug!(path = %relative, bytes = upload.bytes.len(), "Image stored");
        Ok(relative)
    }

    async fn remove(&self, relative_path: &str) -> Result<(), ImageStoreError> {
        let target = self.resolve(relative_path)?;
        tokio::fs::remove_file(&target).await?;
        Ok(())
    }
}
