//! In-memory post and user repositories sharing one store.
//!
//! Both collections sit behind a single async `RwLock`, so the paired
//! post/user writes are applied atomically.
//! Note: Data is lost on process restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use feed_core::domain::{Post, PostWithCreator, User};
use feed_core::error::RepoError;
use feed_core::ports::{BaseRepository, PostRepository, UserRepository};

#[derive(Default)]
struct State {
    posts: HashMap<Uuid, Post>,
    users: HashMap<Uuid, User>,
}

impl State {
    fn with_creator(&self, post: &Post) -> PostWithCreator {
        PostWithCreator {
            post: post.clone(),
            creator: self.users.get(&post.creator).cloned(),
        }
    }
}

/// Shared backing store for the in-memory repositories.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryPostRepository {
            state: Arc::clone(&self.state),
        }
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryUserRepository {
            state: Arc::clone(&self.state),
        }
    }
}

/// In-memory user repository.
pub struct InMemoryUserRepository {
    state: Arc<RwLock<State>>,
}

/// In-memory post repository.
pub struct InMemoryPostRepository {
    state: Arc<RwLock<State>>,
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut state = self.state.write().await;
        let taken = state
            .users
            .values()
            .any(|existing| existing.email == user.email && existing.id != user.id);
        if taken {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        match self.state.write().await.users.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.state.read().await.posts.get(&id).cloned())
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&post.creator) {
            return Err(RepoError::Constraint(format!(
                "creator {} does not exist",
                post.creator
            )));
        }
        state.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        match self.state.write().await.posts.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn count(&self) -> Result<u64, RepoError> {
        Ok(self.state.read().await.posts.len() as u64)
    }

    async fn find_page(&self, offset: u64, limit: u64) -> Result<Vec<PostWithCreator>, RepoError> {
        let state = self.state.read().await;

        let mut posts: Vec<&Post> = state.posts.values().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(posts
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|post| state.with_creator(post))
            .collect())
    }

    async fn find_with_creator(&self, id: Uuid) -> Result<Option<PostWithCreator>, RepoError> {
        let state = self.state.read().await;
        Ok(state.posts.get(&id).map(|post| state.with_creator(post)))
    }

    async fn create_for_creator(&self, post: Post) -> Result<User, RepoError> {
        let mut state = self.state.write().await;

        let creator = state
            .users
            .get_mut(&post.creator)
            .ok_or(RepoError::NotFound)?;
        creator.attach_post(post.id);
        let creator = creator.clone();

        state.posts.insert(post.id, post);
        Ok(creator)
    }

    async fn delete_for_creator(&self, post_id: Uuid, creator_id: Uuid) -> Result<(), RepoError> {
        let mut state = self.state.write().await;

        if state.posts.remove(&post_id).is_none() {
            return Err(RepoError::NotFound);
        }
        if let Some(creator) = state.users.get_mut(&creator_id) {
            creator.detach_post(post_id);
        }
        Ok(())
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut state = self.state.write().await;
        let stored = state.posts.get_mut(&post.id).ok_or(RepoError::NotFound)?;
        *stored = post.clone();
        Ok(post)
    }
}
