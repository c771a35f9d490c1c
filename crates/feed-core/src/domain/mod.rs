//! Domain entities - the core business objects.

mod post;
mod user;

pub use post::{Post, PostWithCreator};
pub use user::User;
