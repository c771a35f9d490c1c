//! `multipart/form-data` bodies of post creation and update.
//!
//! Text parts `title`, `content` and `image` (an existing image path) plus an
//! optional `image` file part.

use actix_multipart::{Field, Multipart, MultipartError};
use futures_util::StreamExt;

use feed_core::ports::ImageUpload;
use feed_core::services::{NewPost, PostChanges};

use crate::middleware::error::{AppError, AppResult};

const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

/// Parsed post form.
#[derive(Debug, Default)]
pub struct PostForm {
    pub title: String,
    pub content: String,
    pub image: Option<ImageUpload>,
    pub image_ref: Option<String>,
}

fn multipart_error(e: MultipartError) -> AppError {
    AppError::BadRequest(format!("Malformed multipart body: {}", e))
}

async fn read_field(field: &mut Field, limit: usize) -> AppResult<Vec<u8>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(multipart_error)?;
        if bytes.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge(format!(
                "form field exceeds {} bytes",
                limit
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn text(name: &str, bytes: Vec<u8>) -> AppResult<String> {
    String::from_utf8(bytes)
        .map_err(|_| AppError::BadRequest(format!("Field '{}' is not valid UTF-8", name)))
}

impl PostForm {
    /// Drain the multipart stream. File parts larger than `max_image_bytes` are rejected.
    pub async fn read(mut payload: Multipart, max_image_bytes: usize) -> AppResult<Self> {
        let mut form = PostForm::default();

        while let Some(field) = payload.next().await {
            let mut field = field.map_err(multipart_error)?;

            let name = field.name().unwrap_or_default().to_owned();
            let file_name = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .filter(|f| !f.is_empty())
                .map(str::to_owned);
            let content_type = field.content_type().map(|m| m.essence_str().to_owned());

            let limit = if file_name.is_some() {
                max_image_bytes
            } else {
                MAX_TEXT_FIELD_BYTES
            };
            let bytes = read_field(&mut field, limit).await?;

            match (name.as_str(), file_name) {
                ("image", Some(file_name)) => {
                    if !bytes.is_empty() {
                        form.image = Some(ImageUpload {
                            file_name,
                            content_type,
                            bytes,
                        });
                    }
                }
                ("image", None) => form.image_ref = Some(text(&name, bytes)?),
                ("title", _) => form.title = text(&name, bytes)?,
                ("content", _) => form.content = text(&name, bytes)?,
                (other, _) => tracing::debug!(field = other, "Ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    pub fn into_new_post(self) -> NewPost {
        NewPost {
            title: self.title,
            content: self.content,
            image: self.image,
        }
    }

    pub fn into_changes(self) -> PostChanges {
        PostChanges {
            title: self.title,
            content: self.content,
            image: self.image,
            image_ref: self.image_ref,
        }
    }
}
