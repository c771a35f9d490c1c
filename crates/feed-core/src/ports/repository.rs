use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Post, PostWithCreator, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
}

/// Post repository.
///
/// The `*_for_creator` methods touch both the post and its creator's post
/// list and must apply both writes or neither.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Total number of stored posts.
    async fn count(&self) -> Result<u64, RepoError>;

    /// One page of posts, newest first, each with its creator resolved.
    async fn find_page(&self, offset: u64, limit: u64) -> Result<Vec<PostWithCreator>, RepoError>;

    /// A single post with its creator resolved.
    async fn find_with_creator(&self, id: Uuid) -> Result<Option<PostWithCreator>, RepoError>;

    /// Insert `post` and append its id to the creator's post list.
    ///
    /// Returns the updated creator, or `RepoError::NotFound` (with nothing
    /// written) when the creator does not exist.
    async fn create_for_creator(&self, post: Post) -> Result<User, RepoError>;

    /// Delete the post and pull one reference to it from the creator's list.
    async fn delete_for_creator(&self, post_id: Uuid, creator_id: Uuid) -> Result<(), RepoError>;

    /// Overwrite an existing post. `RepoError::NotFound` if it is gone; never inserts.
    async fn update(&self, post: Post) -> Result<Post, RepoError>;
}
