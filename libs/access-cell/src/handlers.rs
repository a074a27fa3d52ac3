use axum::{
    extract::Extension,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::AppQuery;

use crate::models::{
    NavigationResponse, PermissionCheckQuery, PermissionsResponse, RoleCheckQuery,
};
use crate::services::{check_role, has_permission, navigation_for, role_permissions};

#[axum::debug_handler]
pub async fn get_permissions(
    Extension(user): Extension<User>,
) -> Result<Json<PermissionsResponse>, AppError> {
    let permissions = user
        .role
        .map(|role| role_permissions(role).to_vec())
        .unwrap_or_default();

    Ok(Json(PermissionsResponse {
        role: user.role,
        permissions,
    }))
}

#[axum::debug_handler]
pub async fn get_navigation(
    Extension(user): Extension<User>,
) -> Result<Json<NavigationResponse>, AppError> {
    Ok(Json(NavigationResponse {
        role: user.role,
        sections: navigation_for(user.role),
    }))
}

#[axum::debug_handler]
pub async fn check_permission(
    Extension(user): Extension<User>,
    AppQuery(query): AppQuery<PermissionCheckQuery>,
) -> Result<Json<Value>, AppError> {
    let granted = has_permission(user.role, &query.permission);
    debug!("Permission {} for {}: {}", query.permission, user.id, granted);

    Ok(Json(json!({
        "permission": query.permission,
        "granted": granted
    })))
}

#[axum::debug_handler]
pub async fn check_roles(
    Extension(user): Extension<User>,
    AppQuery(query): AppQuery<RoleCheckQuery>,
) -> Result<Json<Value>, AppError> {
    // Unknown tags are ignored rather than rejected
    let allowed: Vec<Role> = query
        .allowed
        .split(',')
        .filter_map(|tag| tag.trim().parse().ok())
        .collect();

    Ok(Json(json!({
        "role": user.role,
        "allowed": allowed,
        "granted": check_role(user.role, &allowed)
    })))
}
