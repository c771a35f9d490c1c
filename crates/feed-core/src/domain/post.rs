use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::User;

/// Post entity - a titled piece of content with an image and a single owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    /// Path of the image relative to the image store root.
    pub image_url: String,
    /// Owning user. Set once at creation.
    pub creator: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post owned by `creator`.
    pub fn new(creator: Uuid, title: String, content: String, image_url: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            content,
            image_url,
            creator,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.creator == user_id
    }

    /// Replace the editable fields. The creator is left untouched.
    pub fn revise(&mut self, title: String, content: String, image_url: String) {
        self.title = title;
        self.content = content;
        self.image_url = image_url;
        self.updated_at = Utc::now();
    }
}

/// A post together with its resolved creator.
///
/// `creator` is `None` when the owning user record no longer exists.
#[derive(Debug, Clone)]
pub struct PostWithCreator {
    pub post: Post,
    pub creator: Option<User>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revise_keeps_creator() {
        let owner = Uuid::new_v4();
        let mut post = Post::new(
            owner,
            "First title".into(),
            "First content".into(),
            "images/a.png".into(),
        );
        let created_at = post.created_at;

        post.revise(
            "Second title".into(),
            "Second content".into(),
            "images/b.png".into(),
        );

        assert_eq!(post.creator, owner);
        assert_eq!(post.title, "Second title");
        assert_eq!(post.image_url, "images/b.png");
        assert_eq!(post.created_at, created_at);
        assert!(post.updated_at >= created_at);
    }

    #[test]
    fn test_is_owned_by() {
        let owner = Uuid::new_v4();
        let post = Post::new(owner, "t".into(), "c".into(), "i".into());

        assert!(post.is_owned_by(owner));
        assert!(!post.is_owned_by(Uuid::new_v4()));
    }
}
