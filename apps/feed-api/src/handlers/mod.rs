//! HTTP handlers and route configuration.

mod auth;
mod health;
mod posts;


use actix_web::web;

use crate::middleware::error::AppError;

/// Configure extractor error mapping and all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        // A path segment that is not a UUID cannot name an existing post.
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::NotFound(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Auth routes
            .service(
                web::scope("/auth")
                    .route("/signup", web::put().to(auth::signup))
                    .route("/login", web::post().to(auth::login)),
            )
            // Feed routes
            .service(
                web::scope("/feed")
                    .route("/posts", web::get().to(posts::list_posts))
                    .route("/post", web::post().to(posts::create_post))
                    .route("/post/{post_id}", web::get().to(posts::get_post))
                    .route("/post/{post_id}", web::put().to(posts::update_post))
                    .route("/post/{post_id}", web::delete().to(posts::delete_post)),
            ),
    );
}
