use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::Local;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use access_cell::{require_permission, Permission};
use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::validation::ValidationErrors;
use shared_utils::extractor::{AppJson, AppQuery};
use shared_utils::query::ListParams;
use shared_utils::validation::parse_date;

use crate::models::{AvailabilityQuery, DoctorFilters, DoctorRequest};
use crate::services::{AvailabilityService, DoctorService};

#[axum::debug_handler]
pub async fn list_doctors(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    AppQuery(filters): AppQuery<DoctorFilters>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&config);
    let page = service.list(&filters, &params, auth.token()).await?;
    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&config);
    let doctor = service.get(doctor_id, auth.token()).await?;
    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    AppJson(request): AppJson<DoctorRequest>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ManageUsers)?;

    let service = DoctorService::new(&config);
    let doctor = service.create(request, auth.token()).await?;
    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<i64>,
    AppJson(request): AppJson<DoctorRequest>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ManageUsers)?;

    let service = DoctorService::new(&config);
    let doctor = service.update(doctor_id, request, auth.token()).await?;
    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn delete_doctor(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(doctor_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ManageUsers)?;

    let service = DoctorService::new(&config);
    service.delete(doctor_id, auth.token()).await?;
    Ok(Json(json!({ "message": "Doctor deleted" })))
}

/// `[{"heure": "HH:00", "disponible": bool}]` for the requested date, today by default.
#[axum::debug_handler]
pub async fn get_availability(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(doctor_id): Path<i64>,
    AppQuery(query): AppQuery<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let date = match query.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => parse_date(raw).ok_or_else(|| {
            ValidationErrors::single("date", "The date does not match the format Y-m-d.")
        })?,
        None => Local::now().date_naive(),
    };

    let service = AvailabilityService::new(&config);
    let slots = service.for_date(doctor_id, date, auth.token()).await?;

    Ok(Json(json!(slots)))
}
