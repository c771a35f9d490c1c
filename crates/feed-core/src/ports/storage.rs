//! Image storage port.

use async_trait::async_trait;

/// Content types accepted for post images.
pub const SUPPORTED_IMAGE_TYPES: [&str; 3] = ["image/png", "image/jpg", "image/jpeg"];

/// An image received with a request, not yet written anywhere.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// File name as sent by the client.
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn has_supported_type(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| SUPPORTED_IMAGE_TYPES.contains(&ct))
    }
}

/// Storage for post images, addressed by paths relative to the store root.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist an upload and return its relative path.
    async fn store(&self, upload: ImageUpload) -> Result<String, ImageStoreError>;

    /// Remove a previously stored image.
    async fn remove(&self, relative_path: &str) -> Result<(), ImageStoreError>;
}

/// Image storage errors.
#[derive(Debug, thiserror::Error)]
pub enum ImageStoreError {
    #[error("Invalid image path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(content_type: Option<&str>) -> ImageUpload {
        ImageUpload {
            file_name: "cat.png".into(),
            content_type: content_type.map(str::to_owned),
            bytes: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_supported_types() {
        assert!(upload(Some("image/png")).has_supported_type());
        assert!(upload(Some("image/jpeg")).has_supported_type());
        assert!(!upload(Some("image/gif")).has_supported_type());
        assert!(!upload(None).has_supported_type());
    }
}
