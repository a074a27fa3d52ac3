use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn access_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/permissions", get(handlers::get_permissions))
        .route("/navigation", get(handlers::get_navigation))
        .route("/check", get(handlers::check_permission))
        .route("/roles", get(handlers::check_roles))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
