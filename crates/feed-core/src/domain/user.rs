use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User entity - an account that owns zero or more posts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    /// Ids of the posts this user created, oldest first.
    pub posts: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID and timestamps.
    pub fn new(email: String, name: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            name,
            password_hash,
            posts: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a post reference.
    pub fn attach_post(&mut self, post_id: Uuid) {
        self.posts.push(post_id);
        self.updated_at = Utc::now();
    }

    /// Remove one reference to `post_id`. Returns whether one was found.
    pub fn detach_post(&mut self, post_id: Uuid) -> bool {
        match self.posts.iter().position(|id| *id == post_id) {
            Some(index) => {
                self.posts.remove(index);
                self.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }
}
