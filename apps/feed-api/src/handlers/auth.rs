//! Account handlers.

use actix_web::{HttpResponse, web};
use std::sync::Arc;
use validator::Validate;

use feed_core::DomainError;
use feed_core::domain::User;
use feed_core::ports::{BaseRepository, PasswordService, TokenService, UserRepository};
use feed_shared::dto::{AuthResponse, LoginRequest, SignupRequest, SignupResponse};

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// PUT /api/auth/signup
pub async fn signup(
    state: web::Data<AppState>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<SignupRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let req = SignupRequest {
        email: body.email.trim().to_lowercase(),
        name: body.name.trim().to_string(),
        password: body.password,
    };
    req.validate().map_err(DomainError::from)?;

    if state.users.find_by_email(&req.email).await?.is_some() {
        let msg = "E-Mail address already exists!".to_string();
        return Err(DomainError::Duplicate(msg).into());
    }

    let password_hash = password_service
        .hash(&req.password)
        .map_err(DomainError::from)?;

    let user = state
        .users
        .save(User::new(req.email, req.name, password_hash))
        .await?;

    tracing::info!(user_id = %user.id, "User created");

    Ok(HttpResponse::Created().json(SignupResponse {
        message: "User created!".to_string(),
        user_id: user.id,
    }))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_email(&req.email.trim().to_lowercase())
        .await?
        .ok_or(DomainError::Unauthorized)?;

    let valid = password_service
        .verify(&req.password, &user.password_hash)
        .map_err(DomainError::from)?;
    if !valid {
        return Err(DomainError::Unauthorized.into());
    }

    let token = token_service
        .generate_token(user.id, &user.email)
        .map_err(|e| DomainError::Internal(e.to_string()))?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: token_service.expiration_seconds().max(0) as u64,
        user_id: user.id,
    }))
}
