use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn appointment_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(list_appointments).post(create_appointment))
        .route(
            "/{id}",
            get(get_appointment)
                .put(update_appointment)
                .delete(delete_appointment),
        )
        .route("/{id}/status", patch(update_appointment_status))
        .route("/patient/{patient_id}", get(list_patient_appointments))
        .route("/doctor/{doctor_id}", get(list_doctor_appointments))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
