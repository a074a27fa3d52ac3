use std::sync::Arc;

use axum::{routing::get, Router};

use access_cell::router::access_routes;
use appointment_cell::router::appointment_routes;
use auth_cell::router::auth_routes;
use doctor_cell::router::doctor_routes;
use facility_cell::router::{facility_routes, nurse_routes};
use medical_record_cell::router::{medical_record_routes, prescription_routes};
use patient_cell::router::create_patient_router;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic API is running!" }))
        .merge(auth_routes(state.clone()))
        .nest("/access", access_routes(state.clone()))
        .nest("/patients", create_patient_router(state.clone()))
        .nest("/medecins", doctor_routes(state.clone()))
        .nest("/rendez-vous", appointment_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/prescriptions", prescription_routes(state.clone()))
        .nest("/dossiersmedicaux", medical_record_routes(state.clone()))
        .nest("/infirmiers", nurse_routes(state.clone()))
        .nest("/etablissements", facility_routes(state))
}
