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

use crate::models::{MedicalRecordFilters, MedicalRecordRequest, PrescriptionFilters, PrescriptionRequest};
use crate::services::{MedicalRecordService, PrescriptionService};

// Medical records

#[axum::debug_handler]
pub async fn list_records(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    AppQuery(filters): AppQuery<MedicalRecordFilters>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ViewMedicalRecords)?;

    let service = MedicalRecordService::new(&config);
    let page = service.list(&filters, &params, auth.token()).await?;
    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn create_record(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    AppJson(request): AppJson<MedicalRecordRequest>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ManageMedicalRecords)?;

    let service = MedicalRecordService::new(&config);
    let record = service.create(request, auth.token()).await?;
    Ok(Json(json!(record)))
}

#[axum::debug_handler]
pub async fn get_record(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(record_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ViewMedicalRecords)?;

    let service = MedicalRecordService::new(&config);
    let record = service.get(record_id, auth.token()).await?;
    Ok(Json(json!(record)))
}

#[axum::debug_handler]
pub async fn update_record(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(record_id): Path<i64>,
    AppJson(request): AppJson<MedicalRecordRequest>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::UpdateMedicalRecords)?;

    let service = MedicalRecordService::new(&config);
    let record = service.update(record_id, request, auth.token()).await?;
    Ok(Json(json!(record)))
}

#[axum::debug_handler]
pub async fn delete_record(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(record_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ManageMedicalRecords)?;

    let service = MedicalRecordService::new(&config);
    service.delete(record_id, auth.token()).await?;
    Ok(Json(json!({ "message": "Medical record deleted" })))
}

#[axum::debug_handler]
pub async fn get_patient_record(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ViewMedicalRecords)?;

    let service = MedicalRecordService::new(&config);
    let record = service.for_patient(patient_id, auth.token()).await?;
    Ok(Json(json!(record)))
}

// Prescriptions

#[axum::debug_handler]
pub async fn list_prescriptions(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    AppQuery(filters): AppQuery<PrescriptionFilters>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ViewMedicalRecords)?;

    let service = PrescriptionService::new(&config);
    let page = service.list(&filters, &params, auth.token()).await?;
    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn create_prescription(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    AppJson(request): AppJson<PrescriptionRequest>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ManageMedicalRecords)?;

    let service = PrescriptionService::new(&config);
    let prescription = service.create(request, auth.token()).await?;
    Ok(Json(json!(prescription)))
}

#[axum::debug_handler]
pub async fn get_prescription(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(prescription_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ViewMedicalRecords)?;

    let service = PrescriptionService::new(&config);
    let prescription = service.get(prescription_id, auth.token()).await?;
    Ok(Json(json!(prescription)))
}

#[axum::debug_handler]
pub async fn update_prescription(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(prescription_id): Path<i64>,
    AppJson(request): AppJson<PrescriptionRequest>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ManageMedicalRecords)?;

    let service = PrescriptionService::new(&config);
    let prescription = service.update(prescription_id, request, auth.token()).await?;
    Ok(Json(json!(prescription)))
}

#[axum::debug_handler]
pub async fn delete_prescription(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(prescription_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ManageMedicalRecords)?;

    let service = PrescriptionService::new(&config);
    service.delete(prescription_id, auth.token()).await?;
    Ok(Json(json!({ "message": "Prescription deleted" })))
}
