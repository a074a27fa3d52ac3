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

use crate::models::{FacilityFilters, FacilityRequest, NurseFilters, NurseRequest};
use crate::services::{FacilityService, NurseService};

#[axum::debug_handler]
pub async fn list_facilities(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    AppQuery(filters): AppQuery<FacilityFilters>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Value>, AppError> {
    let service = FacilityService::new(&config);
    let page = service.list(&filters, &params, auth.token()).await?;
    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn get_facility(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(facility_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = FacilityService::new(&config);
    let facility = service.get(facility_id, auth.token()).await?;
    Ok(Json(json!(facility)))
}

#[axum::debug_handler]
pub async fn create_facility(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    AppJson(request): AppJson<FacilityRequest>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ManageUsers)?;

    let service = FacilityService::new(&config);
    let facility = service.create(request, auth.token()).await?;
    Ok(Json(json!(facility)))
}

#[axum::debug_handler]
pub async fn update_facility(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(facility_id): Path<i64>,
    AppJson(request): AppJson<FacilityRequest>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ManageUsers)?;

    let service = FacilityService::new(&config);
    let facility = service.update(facility_id, request, auth.token()).await?;
    Ok(Json(json!(facility)))
}

#[axum::debug_handler]
pub async fn delete_facility(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(facility_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ManageUsers)?;

    let service = FacilityService::new(&config);
    service.delete(facility_id, auth.token()).await?;
    Ok(Json(json!({ "message": "Facility deleted" })))
}

#[axum::debug_handler]
pub async fn list_nurses(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    AppQuery(filters): AppQuery<NurseFilters>,
    AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Value>, AppError> {
    let service = NurseService::new(&config);
    let page = service.list(&filters, &params, auth.token()).await?;
    Ok(Json(json!(page)))
}

#[axum::debug_handler]
pub async fn get_nurse(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(nurse_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = NurseService::new(&config);
    let nurse = service.get(nurse_id, auth.token()).await?;
    Ok(Json(json!(nurse)))
}

#[axum::debug_handler]
pub async fn create_nurse(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    AppJson(request): AppJson<NurseRequest>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ManageUsers)?;

    let service = NurseService::new(&config);
    let nurse = service.create(request, auth.token()).await?;
    Ok(Json(json!(nurse)))
}

#[axum::debug_handler]
pub async fn update_nurse(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(nurse_id): Path<i64>,
    AppJson(request): AppJson<NurseRequest>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ManageUsers)?;

    let service = NurseService::new(&config);
    let nurse = service.update(nurse_id, request, auth.token()).await?;
    Ok(Json(json!(nurse)))
}

#[axum::debug_handler]
pub async fn delete_nurse(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Path(nurse_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    require_permission(&user, Permission::ManageUsers)?;

    let service = NurseService::new(&config);
    service.delete(nurse_id, auth.token()).await?;
    Ok(Json(json!({ "message": "Nurse deleted" })))
}
