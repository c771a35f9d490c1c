//! Post use-cases driven over the in-memory adapters.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use feed_core::domain::User;
use feed_core::ports::{
    BaseRepository, ImageStore, ImageStoreError, ImageUpload, PostRepository,
};
use feed_core::services::{NewPost, POSTS_PER_PAGE, PostChanges, PostService};
use feed_core::DomainError;
use feed_infra::{InMemoryStore, LocalImageStore};

/// Image store that keeps names as-is and reports every removal attempt.
struct RecordingImages {
    removals: mpsc::UnboundedSender<String>,
    fail_removals: AtomicBool,
}

#[async_trait]
impl ImageStore for RecordingImages {
    async fn store(&self, upload: ImageUpload) -> Result<String, ImageStoreError> {
        Ok(format!("images/{}", upload.file_name))
    }

    async fn remove(&self, relative_path: &str) -> Result<(), ImageStoreError> {
        let _ = self.removals.send(relative_path.to_string());
        if self.fail_removals.load(Ordering::SeqCst) {
            return Err(ImageStoreError::Io(std::io::Error::other("disk on fire")));
        }
        Ok(())
    }
}

struct Harness {
    store: InMemoryStore,
    images: Arc<RecordingImages>,
    removals: mpsc::UnboundedReceiver<String>,
    service: PostService,
}

impl Harness {
    fn new() -> Self {
        let store = InMemoryStore::new();
        let (tx, removals) = mpsc::unbounded_channel();
        let images = Arc::new(RecordingImages {
            removals: tx,
            fail_removals: AtomicBool::new(false),
        });
        let service = PostService::new(Arc::new(store.posts()), images.clone());
        Self {
            store,
            images,
            removals,
            service,
        }
    }

    async fn user(&self, name: &str) -> User {
        let user = User::new(
            format!("{}@example.com", name.to_lowercase()),
            name.to_string(),
            "hash".to_string(),
        );
        self.store.users().save(user).await.unwrap()
    }

    async fn next_removal(&mut self) -> String {
        tokio::time::timeout(Duration::from_secs(2), self.removals.recv())
            .await
            .expect("image removal was not attempted")
            .expect("channel closed")
    }

    async fn assert_no_more_removals(&mut self) {
        let extra = tokio::time::timeout(Duration::from_millis(100), self.removals.recv()).await;
        assert!(extra.is_err(), "unexpected removal: {:?}", extra);
    }
}

fn png(name: &str) -> ImageUpload {
    ImageUpload {
        file_name: name.to_string(),
        content_type: Some("image/png".to_string()),
        bytes: vec![0x89, b'P', b'N', b'G'],
    }
}

fn new_post(title: &str, image: Option<ImageUpload>) -> NewPost {
    NewPost {
        title: title.to_string(),
        content: "Some content here".to_string(),
        image,
    }
}

#[tokio::test]
async fn test_list_posts_pages_by_two_and_reports_total() {
    let h = Harness::new();
    let user = h.user("Ada").await;
    for i in 0..5 {
        h.service
            .create_post(user.id, new_post(&format!("Post number {i}"), Some(png("a.png"))))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let first = h.service.list_posts(1).await.unwrap();
    let third = h.service.list_posts(3).await.unwrap();
    let beyond = h.service.list_posts(4).await.unwrap();

    assert_eq!(POSTS_PER_PAGE, 2);
    assert_eq!(first.posts.len(), 2);
    assert_eq!(third.posts.len(), 1);
    assert!(beyond.posts.is_empty());
    for page in [&first, &third, &beyond] {
        assert_eq!(page.total_items, 5);
    }

    // Newest first: page 1 holds posts 4 and 3, page 3 holds post 0.
    assert_eq!(first.posts[0].post.title, "Post number 4");
    assert_eq!(first.posts[1].post.title, "Post number 3");
    assert_eq!(third.posts[0].post.title, "Post number 0");
    assert_eq!(
        first.posts[0].creator.as_ref().map(|c| c.name.as_str()),
        Some("Ada")
    );
}

#[tokio::test]
async fn test_create_without_image_persists_nothing() {
    let h = Harness::new();
    let user = h.user("Ada").await;

    let err = h
        .service
        .create_post(user.id, new_post("Valid title", None))
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::Validation(ref m) if m == "No image provided"));
    assert_eq!(h.store.posts().count().await.unwrap(), 0);
    let user = h.store.users().find_by_id(user.id).await.unwrap().unwrap();
    assert!(user.posts.is_empty());
}

#[tokio::test]
async fn test_create_appends_exactly_one_reference() {
    let h = Harness::new();
    let user = h.user("Ada").await;

    let created = h
        .service
        .create_post(user.id, new_post("  Valid title  ", Some(png("img1.png"))))
        .await
        .unwrap();

    assert_eq!(created.post.title, "Valid title");
    assert_eq!(created.post.creator, user.id);
    assert_eq!(created.post.image_url, "images/img1.png");
    assert_eq!(created.creator.id, user.id);
    assert_eq!(created.creator.posts, vec![created.post.id]);

    assert_eq!(h.store.posts().count().await.unwrap(), 1);
    let stored = h.store.users().find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.posts, vec![created.post.id]);
}

#[tokio::test]
async fn test_create_for_unknown_user_is_not_found_and_clears_upload() {
    let mut h = Harness::new();
    let ghost = Uuid::new_v4();

    let err = h
        .service
        .create_post(ghost, new_post("Valid title", Some(png("img1.png"))))
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::NotFound { entity_type: "User", id } if id == ghost));
    assert_eq!(h.store.posts().count().await.unwrap(), 0);
    assert_eq!(h.next_removal().await, "images/img1.png");
}

#[tokio::test]
async fn test_get_unknown_post_is_not_found() {
    let mut h = Harness::new();
    let missing = Uuid::new_v4();

    let err = h.service.get_post(missing).await.unwrap_err();

    assert!(matches!(err, DomainError::NotFound { entity_type: "Post", id } if id == missing));
    h.assert_no_more_removals().await;
}

#[tokio::test]
async fn test_update_by_stranger_is_forbidden_and_leaves_post_alone() {
    let mut h = Harness::new();
    let owner = h.user("Ada").await;
    let stranger = h.user("Bob").await;
    let created = h
        .service
        .create_post(owner.id, new_post("Original title", Some(png("img1.png"))))
        .await
        .unwrap();

    let err = h
        .service
        .update_post(
            created.post.id,
            stranger.id,
            PostChanges {
                title: "Hijacked title".into(),
                content: "Hijacked content".into(),
                image: Some(png("img2.png")),
                image_ref: None,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::Forbidden));
    let stored = h.store.posts().find_by_id(created.post.id).await.unwrap().unwrap();
    assert_eq!(stored, created.post);
    h.assert_no_more_removals().await;
}

#[tokio::test]
async fn test_update_keeping_image_reference_does_not_clear_it() {
    let mut h = Harness::new();
    let owner = h.user("Ada").await;
    let created = h
        .service
        .create_post(owner.id, new_post("Original title", Some(png("img1.png"))))
        .await
        .unwrap();

    let updated = h
        .service
        .update_post(
            created.post.id,
            owner.id,
            PostChanges {
                title: "Edited title".into(),
                content: "Edited content".into(),
                image: None,
                image_ref: Some(created.post.image_url.clone()),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.post.title, "Edited title");
    assert_eq!(updated.post.image_url, "images/img1.png");
    h.assert_no_more_removals().await;
}

#[tokio::test]
async fn test_update_with_new_image_attempts_one_removal_even_if_it_fails() {
    let mut h = Harness::new();
    h.images.fail_removals.store(true, Ordering::SeqCst);
    let owner = h.user("Ada").await;
    let created = h
        .service
        .create_post(owner.id, new_post("Original title", Some(png("img1.png"))))
        .await
        .unwrap();

    let updated = h
        .service
        .update_post(
            created.post.id,
            owner.id,
            PostChanges {
                title: "Edited title".into(),
                content: "Edited content".into(),
                image: Some(png("img2.png")),
                image_ref: Some("images/img1.png".into()),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.post.image_url, "images/img2.png");
    assert_eq!(h.next_removal().await, "images/img1.png");
    h.assert_no_more_removals().await;
}

#[tokio::test]
async fn test_delete_removes_post_and_one_reference() {
    let mut h = Harness::new();
    let owner = h.user("Ada").await;
    let keep = h
        .service
        .create_post(owner.id, new_post("Keep this one", Some(png("keep.png"))))
        .await
        .unwrap();
    let doomed = h
        .service
        .create_post(owner.id, new_post("Delete this one", Some(png("doomed.png"))))
        .await
        .unwrap();

    h.service.delete_post(doomed.post.id, owner.id).await.unwrap();

    assert_eq!(h.next_removal().await, "images/doomed.png");
    let stored = h.store.users().find_by_id(owner.id).await.unwrap().unwrap();
    assert_eq!(stored.posts, vec![keep.post.id]);
    assert_eq!(h.store.posts().count().await.unwrap(), 1);

    let again = h.service.delete_post(doomed.post.id, owner.id).await.unwrap_err();
    assert!(matches!(again, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn test_create_update_delete_round_trip() {
    let mut h = Harness::new();
    let u1 = h.user("Ada").await;
    let u2 = h.user("Bob").await;

    let created = h
        .service
        .create_post(
            u1.id,
            NewPost {
                title: "AAAAA".into(),
                content: "BBBBB".into(),
                image: Some(png("img1.png")),
            },
        )
        .await
        .unwrap();
    assert_eq!(created.post.creator, u1.id);
    let post_id = created.post.id;

    let updated = h
        .service
        .update_post(
            post_id,
            u1.id,
            PostChanges {
                title: "AAAAA".into(),
                content: "BBBBB".into(),
                image: Some(png("img2.png")),
                image_ref: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.post.image_url, "images/img2.png");
    assert_eq!(h.next_removal().await, "images/img1.png");

    let err = h.service.delete_post(post_id, u2.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden));
    assert!(h.service.get_post(post_id).await.is_ok());

    h.service.delete_post(post_id, u1.id).await.unwrap();
    assert_eq!(h.next_removal().await, "images/img2.png");

    let err = h.service.get_post(post_id).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn test_update_with_foreign_image_reference_is_rejected() {
    let mut h = Harness::new();
    let owner = h.user("Ada").await;
    let other = h.user("Bob").await;
    let created = h
        .service
        .create_post(owner.id, new_post("Original title", Some(png("img1.png"))))
        .await
        .unwrap();
    let theirs = h
        .service
        .create_post(other.id, new_post("Someone else", Some(png("theirs.png"))))
        .await
        .unwrap();

    for image_ref in [".env", "Cargo.toml", "images/theirs.png"] {
        let err = h
            .service
            .update_post(
                created.post.id,
                owner.id,
                PostChanges {
                    title: "Edited title".into(),
                    content: "Edited content".into(),
                    image: None,
                    image_ref: Some(image_ref.into()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)), "{}", image_ref);
    }

    let stored = h.service.get_post(created.post.id).await.unwrap();
    assert_eq!(stored.post, created.post);

    h.service.delete_post(created.post.id, owner.id).await.unwrap();
    assert_eq!(h.next_removal().await, "images/img1.png");
    h.assert_no_more_removals().await;
    assert!(h.service.get_post(theirs.post.id).await.is_ok());
}

#[tokio::test]
async fn test_files_outside_upload_dir_survive_post_lifecycle() {
    let root = tempfile::tempdir().unwrap();
    let secret = root.path().join(".env");
    std::fs::write(&secret, "JWT_SECRET=hunter2").unwrap();

    let store = InMemoryStore::new();
    let service = PostService::new(
        Arc::new(store.posts()),
        Arc::new(LocalImageStore::new(root.path(), "images")),
    );
    let owner = User::new("ada@example.com".into(), "Ada".into(), "hash".into());
    let owner = store.users().save(owner).await.unwrap();

    let created = service
        .create_post(owner.id, new_post("Original title", Some(png("img1.png"))))
        .await
        .unwrap();
    let image = root.path().join(&created.post.image_url);
    assert!(image.exists());

    let err = service
        .update_post(
            created.post.id,
            owner.id,
            PostChanges {
                title: "Edited title".into(),
                content: "Edited content".into(),
                image: None,
                image_ref: Some(".env".into()),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    service.delete_post(created.post.id, owner.id).await.unwrap();

    for _ in 0..50 {
        if !image.exists() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(!image.exists());
    assert!(secret.exists());
}

/// Image store that deletes a chosen post while an upload is in flight.
struct DeletingImages {
    store: InMemoryStore,
    victim: Mutex<Option<(Uuid, Uuid)>>,
    removals: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl ImageStore for DeletingImages {
    async fn store(&self, upload: ImageUpload) -> Result<String, ImageStoreError> {
        let victim = self.victim.lock().unwrap().take();
        if let Some((post_id, creator_id)) = victim {
            self.store
                .posts()
                .delete_for_creator(post_id, creator_id)
                .await
                .unwrap();
        }
        Ok(format!("images/{}", upload.file_name))
    }

    async fn remove(&self, relative_path: &str) -> Result<(), ImageStoreError> {
        let _ = self.removals.send(relative_path.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn test_update_racing_a_delete_does_not_resurrect_the_post() {
    let store = InMemoryStore::new();
    let (tx, mut removals) = mpsc::unbounded_channel();
    let images = Arc::new(DeletingImages {
        store: store.clone(),
        victim: Mutex::new(None),
        removals: tx,
    });
    let service = PostService::new(Arc::new(store.posts()), images.clone());
    let owner = User::new("ada@example.com".into(), "Ada".into(), "hash".into());
    let owner = store.users().save(owner).await.unwrap();

    let created = service
        .create_post(owner.id, new_post("Original title", Some(png("img1.png"))))
        .await
        .unwrap();
    *images.victim.lock().unwrap() = Some((created.post.id, owner.id));

    let err = service
        .update_post(
            created.post.id,
            owner.id,
            PostChanges {
                title: "Edited title".into(),
                content: "Edited content".into(),
                image: Some(png("img2.png")),
                image_ref: None,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::NotFound { .. }));
    assert!(store.posts().find_by_id(created.post.id).await.unwrap().is_none());
    let owner = store.users().find_by_id(owner.id).await.unwrap().unwrap();
    assert!(owner.posts.is_empty());

    let removed = tokio::time::timeout(Duration::from_secs(2), removals.recv())
        .await
        .expect("new upload was not cleared")
        .expect("channel closed");
    assert_eq!(removed, "images/img2.png");
}
