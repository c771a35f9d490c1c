//! Post handlers.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use uuid::Uuid;

use feed_core::domain::{Post, PostWithCreator, User};
use feed_shared::dto::{
    CreatePostResponse, CreatorResponse, ListPostsQuery, ListPostsResponse, MessageResponse,
    PostEnvelope, PostResponse,
};

use crate::forms::PostForm;
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn creator_response(id: Uuid, creator: Option<&User>) -> CreatorResponse {
    CreatorResponse {
        id,
        name: creator.map(|user| user.name.clone()),
    }
}

fn post_response(post: Post, creator: Option<&User>) -> PostResponse {
    PostResponse {
        creator: creator_response(post.creator, creator),
        id: post.id,
        title: post.title,
        content: post.content,
        image_url: post.image_url,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

fn resolved(item: PostWithCreator) -> PostResponse {
    post_response(item.post, item.creator.as_ref())
}

/// GET /api/feed/posts?page=N
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<ListPostsQuery>,
) -> AppResult<HttpResponse> {
    let page = state.posts.list_posts(query.page.unwrap_or(1)).await?;

    Ok(HttpResponse::Ok().json(ListPostsResponse {
        message: "Posts fetched".to_string(),
        posts: page.posts.into_iter().map(resolved).collect(),
        total_items: page.total_items,
    }))
}

/// POST /api/feed/post
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let form = PostForm::read(payload, state.max_image_bytes).await?;

    let created = state
        .posts
        .create_post(identity.user_id, form.into_new_post())
        .await?;

    let creator = creator_response(created.creator.id, Some(&created.creator));
    Ok(HttpResponse::Created().json(CreatePostResponse {
        message: "Post created successfully!".to_string(),
        post: post_response(created.post, Some(&created.creator)),
        creator,
    }))
}

/// GET /api/feed/post/{post_id}
pub async fn get_post(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state.posts.get_post(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(PostEnvelope {
        message: "Post fetched".to_string(),
        post: resolved(post),
    }))
}

/// PUT /api/feed/post/{post_id}
pub async fn update_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let form = PostForm::read(payload, state.max_image_bytes).await?;

    let updated = state
        .posts
        .update_post(path.into_inner(), identity.user_id, form.into_changes())
        .await?;

    Ok(HttpResponse::Ok().json(PostEnvelope {
        message: "Post updated!".to_string(),
        post: resolved(updated),
    }))
}

/// DELETE /api/feed/post/{post_id}
pub async fn delete_post(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .posts
        .delete_post(path.into_inner(), identity.user_id)
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Post deleted")))
}
