//! Post use-cases: paging, creation, edits and removal with ownership checks.

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::domain::{Post, PostWithCreator, User};
use crate::error::{DomainError, RepoError};
use crate::ports::{ImageStore, ImageUpload, PostRepository};

/// Fixed number of posts per listing page.
pub const POSTS_PER_PAGE: u64 = 2;

/// Input for [`PostService::create_post`].
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub image: Option<ImageUpload>,
}

/// Input for [`PostService::update_post`].
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: String,
    pub content: String,
    /// Freshly uploaded replacement image.
    pub image: Option<ImageUpload>,
    /// Image reference echoed back by the client when no file is uploaded.
    pub image_ref: Option<String>,
}

/// One page of the post listing.
#[derive(Debug, Clone)]
pub struct PostPage {
    pub posts: Vec<PostWithCreator>,
    pub total_items: u64,
}

/// Result of a successful creation.
#[derive(Debug, Clone)]
pub struct CreatedPost {
    pub post: Post,
    pub creator: User,
}

#[derive(Debug, Validate)]
struct PostFields {
    #[validate(length(min = 5, message = "must be at least 5 characters"))]
    title: String,
    #[validate(length(min = 5, message = "must be at least 5 characters"))]
    content: String,
}

impl PostFields {
    fn checked(title: &str, content: &str) -> Result<Self, DomainError> {
        let fields = Self {
            title: title.trim().to_string(),
            content: content.trim().to_string(),
        };
        fields.validate()?;
        Ok(fields)
    }
}

enum ImageSource {
    Upload(ImageUpload),
    Existing(String),
}

/// Post use-cases.
#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    images: Arc<dyn ImageStore>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>, images: Arc<dyn ImageStore>) -> Self {
        Self { posts, images }
    }

    /// List page `page` (1-based) of posts together with the total count.
    pub async fn list_posts(&self, page: u64) -> Result<PostPage, DomainError> {
        if page < 1 {
            return Err(DomainError::Validation(
                "page: must be at least 1".to_string(),
            ));
        }

        let total_items = self.posts.count().await?;
        let offset = (page - 1) * POSTS_PER_PAGE;
        let posts = self.posts.find_page(offset, POSTS_PER_PAGE).await?;

        tracing::debug!(page, offset, total_items, fetched = posts.len(), "Posts fetched");

        Ok(PostPage { posts, total_items })
    }

    /// Create a post owned by `acting_user`.
    pub async fn create_post(
        &self,
        acting_user: Uuid,
        input: NewPost,
    ) -> Result<CreatedPost, DomainError> {
        let fields = PostFields::checked(&input.title, &input.content)?;

        let image = input
            .image
            .filter(ImageUpload::has_supported_type)
            .ok_or_else(|| DomainError::Validation("No image provided".to_string()))?;

        let image_url = self.images.store(image).await?;
        let post = Post::new(acting_user, fields.title, fields.content, image_url);

        let creator = match self.posts.create_for_creator(post.clone()).await {
            Ok(creator) => creator,
            Err(e) => {
                self.clear_image(post.image_url.clone());
                return Err(match e {
                    RepoError::NotFound => DomainError::user_not_found(acting_user),
                    other => other.into(),
                });
            }
        };

        tracing::info!(post_id = %post.id, creator = %acting_user, "Post created");

        Ok(CreatedPost { post, creator })
    }

    /// Fetch a single post with its creator.
    pub async fn get_post(&self, post_id: Uuid) -> Result<PostWithCreator, DomainError> {
        self.posts
            .find_with_creator(post_id)
            .await?
            .ok_or_else(|| DomainError::post_not_found(post_id))
    }

    /// Replace title, content and image of a post owned by `acting_user`.
    pub async fn update_post(
        &self,
        post_id: Uuid,
        acting_user: Uuid,
        changes: PostChanges,
    ) -> Result<PostWithCreator, DomainError> {
        let fields = PostFields::checked(&changes.title, &changes.content)?;

        let upload = changes.image.filter(ImageUpload::has_supported_type);
        let image_ref = changes
            .image_ref
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        let source = match (upload, image_ref) {
            (Some(upload), _) => ImageSource::Upload(upload),
            (None, Some(image_ref)) => ImageSource::Existing(image_ref),
            (None, None) => {
                return Err(DomainError::Validation("No file selected".to_string()));
            }
        };

        let PostWithCreator { mut post, creator } = self.get_post(post_id).await?;

        if !post.is_owned_by(acting_user) {
            tracing::warn!(post_id = %post_id, acting_user = %acting_user, "Update rejected: not the creator");
            return Err(DomainError::Forbidden);
        }

        let (image_url, stored_new) = match source {
            ImageSource::Upload(upload) => (self.images.store(upload).await?, true),
            // A post may only keep its own image.
            ImageSource::Existing(image_ref) if image_ref == post.image_url => {
                (image_ref, false)
            }
            ImageSource::Existing(image_ref) => {
                tracing::warn!(post_id = %post_id, image_ref = %image_ref, "Update rejected: foreign image reference");
                return Err(DomainError::Validation(
                    "image: does not reference the post's current image".to_string(),
                ));
            }
        };

        let previous_image = post.image_url.clone();
        post.revise(fields.title, fields.content, image_url.clone());

        let saved = match self.posts.update(post).await {
            Ok(saved) => saved,
            Err(e) => {
                if stored_new {
                    self.clear_image(image_url);
                }
                return Err(match e {
                    RepoError::NotFound => DomainError::post_not_found(post_id),
                    other => other.into(),
                });
            }
        };

        if saved.image_url != previous_image {
            self.clear_image(previous_image);
        }

        tracing::info!(post_id = %post_id, "Post updated");

        Ok(PostWithCreator {
            post: saved,
            creator,
        })
    }

    /// Delete a post owned by `acting_user`.
    pub async fn delete_post(&self, post_id: Uuid, acting_user: Uuid) -> Result<(), DomainError> {
        let post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::post_not_found(post_id))?;

        if !post.is_owned_by(acting_user) {
            tracing::warn!(post_id = %post_id, acting_user = %acting_user, "Delete rejected: not the creator");
            return Err(DomainError::Forbidden);
        }

        self.posts
            .delete_for_creator(post_id, acting_user)
            .await
            .map_err(|e| match e {
                RepoError::NotFound => DomainError::post_not_found(post_id),
                other => other.into(),
            })?;

        self.clear_image(post.image_url);

        tracing::info!(post_id = %post_id, "Post deleted");

        Ok(())
    }

    /// Remove an image file in the background. Failures are only logged.
    fn clear_image(&self, relative_path: String) {
        let images = Arc::clone(&self.images);
        tokio::spawn(async move {
            match images.remove(&relative_path).await {
                Ok(()) => tracing::debug!(path = %relative_path, "Image removed"),
                Err(e) => tracing::warn!(path = %relative_path, error = %e, "Failed to remove image"),
            }
        });
    }
}
