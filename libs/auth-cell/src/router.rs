use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn auth_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/login", post(handlers::login))
        .route("/register", post(handlers::register));

    let protected_routes = Router::new()
        .route("/logout", post(handlers::logout))
        .route("/user", get(handlers::current_user))
        .route(
            "/profile",
            get(handlers::show_profile).put(handlers::update_profile),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
