use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use access_cell::role_permissions;
use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::AppJson;

use crate::models::{LinkedProfile, LoginRequest, LoginResponse, RegisterRequest};
use crate::services::{AuthService, ProfileService};

#[axum::debug_handler]
pub async fn login(
    State(config): State<Arc<AppConfig>>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let credentials = request.validate()?;
    let service = AuthService::new(&config);

    let session = service.login(&credentials).await?;

    Ok(Json(LoginResponse {
        message: "Login successful",
        access_token: session.access_token,
        token_type: session.token_type.unwrap_or_else(|| "bearer".to_string()),
        expires_in: session.expires_in,
        refresh_token: session.refresh_token,
        user: session.user.into_user(),
    }))
}

#[axum::debug_handler]
pub async fn register(
    State(config): State<Arc<AppConfig>>,
    AppJson(request): AppJson<RegisterRequest>,
) -> Result<Json<Value>, AppError> {
    let registration = request.validate()?;
    let service = AuthService::new(&config);

    let user = service.register(&registration).await?;

    Ok(Json(json!({
        "message": "Account created",
        "user": user
    })))
}

#[axum::debug_handler]
pub async fn logout(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let service = AuthService::new(&config);

    service.logout(auth.token()).await?;

    Ok(Json(json!({ "message": "Logged out" })))
}

#[axum::debug_handler]
pub async fn current_user(Extension(user): Extension<User>) -> Result<Json<Value>, AppError> {
    let permissions = user.role.map(role_permissions).unwrap_or_default();

    Ok(Json(json!({
        "id": user.id,
        "email": user.email,
        "name": user.name,
        "role": user.role,
        "permissions": permissions
    })))
}

fn profile_response(user: &User, profile: Option<LinkedProfile>) -> Value {
    let (kind, row) = match profile {
        Some(profile) => (Some(profile.kind), profile.row),
        None => (None, Value::Null),
    };

    json!({
        "id": user.id,
        "email": user.email,
        "name": user.name,
        "role": user.role,
        "profile_type": kind,
        "profile": row
    })
}

#[axum::debug_handler]
pub async fn show_profile(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&config);

    let profile = service.linked(&user, auth.token()).await?;

    Ok(Json(profile_response(&user, profile)))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    AppJson(body): AppJson<Value>,
) -> Result<Json<Value>, AppError> {
    let service = ProfileService::new(&config);

    let profile = service.update(&user, body, auth.token()).await?;

    Ok(Json(profile_response(&user, Some(profile))))
}
