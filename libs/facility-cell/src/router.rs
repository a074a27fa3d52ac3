use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn facility_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(list_facilities).post(create_facility))
        .route(
            "/{id}",
            get(get_facility).put(update_facility).delete(delete_facility),
        )
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}

pub fn nurse_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(list_nurses).post(create_nurse))
        .route("/{id}", get(get_nurse).put(update_nurse).delete(delete_nurse))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
