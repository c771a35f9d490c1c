//! Use-cases built on top of the ports.

mod posts;

pub use posts::{CreatedPost, NewPost, POSTS_PER_PAGE, PostChanges, PostPage, PostService};
