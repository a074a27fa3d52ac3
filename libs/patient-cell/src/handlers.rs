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

use crate::models::{PatientFilters, PatientRequest, PatientSearchQuery};
use crate::services::PatientService;

#[axum::debug_handler]
pub async fn list_patients(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    AppQuery(filters): AppQuery<PatientFilters>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ViewPatients)?;

    let service = PatientService::new(&config);
    let page = service.list(&filters, &params, auth.token()).await?;

    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn search_patients(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    AppQuery(query): AppQuery<PatientSearchQuery>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ViewPatients)?;

    let service = PatientService::new(&config);
    let patients = service.search(query.term.as_deref(), auth.token()).await?;

    Ok(Json(json!(patients)))
}

#[axum::debug_handler]
pub async fn create_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    AppJson(request): AppJson<PatientRequest>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ManagePatients)?;

    let service = PatientService::new(&config);
    let patient = service.create(request, auth.token()).await?;

    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ViewPatients)?;

    let service = PatientService::new(&config);
    let patient = service.get_detail(patient_id, auth.token()).await?;

    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<i64>,
    AppJson(request): AppJson<PatientRequest>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ManagePatients)?;

    let service = PatientService::new(&config);
    let patient = service.update(patient_id, request, auth.token()).await?;

    Ok(Json(json!(patient)))
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ManagePatients)?;

    let service = PatientService::new(&config);
    service.delete(patient_id, auth.token()).await?;

    Ok(Json(json!({ "message": "Patient deleted" })))
}
