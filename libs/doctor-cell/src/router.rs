use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn doctor_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(list_doctors).post(create_doctor))
        .route(
            "/{id}",
            get(get_doctor).put(update_doctor).delete(delete_doctor),
        )
        .route("/{id}/availability", get(get_availability))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
