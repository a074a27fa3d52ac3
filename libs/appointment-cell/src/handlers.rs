use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use access_cell::{require_permission, Permission};
use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::{AppJson, AppQuery};
use shared_utils::query::ListParams;

use crate::models::{AppointmentFilters, AppointmentRequest, StatusUpdateRequest};
use crate::services::BookingService;

#[axum::debug_handler]
pub async fn list_appointments(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    AppQuery(filters): AppQuery<AppointmentFilters>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ViewAppointments)?;

    let service = BookingService::new(&config);
    let page = service.list(&filters, &params, auth.token()).await?;
    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    AppJson(request): AppJson<AppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ManageAppointments)?;

    let service = BookingService::new(&config);
    let appointment = service.create(request, auth.token()).await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ViewAppointments)?;

    let service = BookingService::new(&config);
    let appointment = service.get(appointment_id, auth.token()).await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
    AppJson(request): AppJson<AppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ManageAppointments)?;

    let service = BookingService::new(&config);
    let appointment = service.update(appointment_id, request, auth.token()).await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
    AppJson(request): AppJson<StatusUpdateRequest>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ManageAppointments)?;

    let service = BookingService::new(&config);
    let appointment = service
        .update_status(appointment_id, request.status.as_deref(), auth.token())
        .await?;
    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ManageAppointments)?;

    let service = BookingService::new(&config);
    service.delete(appointment_id, auth.token()).await?;
    Ok(Json(json!({ "message": "Appointment deleted" })))
}

#[axum::debug_handler]
pub async fn list_patient_appointments(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<i64>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ViewAppointments)?;

    let service = BookingService::new(&config);
    let page = service.list_for_patient(patient_id, &params, auth.token()).await?;
    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn list_doctor_appointments(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<i64>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ViewAppointments)?;

    let service = BookingService::new(&config);
    let page = service.list_for_doctor(doctor_id, &params, auth.token()).await?;
    Ok(Json(json!(page)))
}
