use serde_json::{json, Value};
use tracing::{debug, info};

use facility_cell::FacilityService;
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::error::AppError;
use shared_models::pagination::Paginated;
use shared_models::validation::ValidationErrors;
use shared_utils::query::{ListParams, ListQuery};

use crate::models::{Doctor, DoctorDetail, DoctorFilters, DoctorRequest};

const TABLE: &str = "doctors";
const SORTABLE: [&str; 5] = ["id", "last_name", "first_name", "specialty", "created_at"];

pub struct DoctorService {
    supabase: SupabaseClient,
    facilities: FacilityService,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            facilities: FacilityService::new(config),
        }
    }

    pub async fn list(
        &self,
        filters: &DoctorFilters,
        params: &ListParams,
        auth_token: &str,
    ) -> Result<Paginated<Doctor>, AppError> {
        let mut query = ListQuery::from_params(params, &SORTABLE, "last_name");

        if let Some(name) = filters.name.as_deref().filter(|n| !n.trim().is_empty()) {
            query = query.any_ilike(&["first_name", "last_name"], name);
        }
        if let Some(specialty) = filters.specialty.as_deref().filter(|s| !s.trim().is_empty()) {
            query = query.ilike("specialty", specialty);
        }

        let (rows, total) = self
            .supabase
            .request_with_count::<Doctor>(&query.to_path(TABLE), Some(auth_token))
            .await?;
        let total = total.unwrap_or(rows.len() as u64);

        Ok(Paginated::new(rows, query.page(), query.per_page(), total))
    }

    /// Doctor with its facility embedded.
    pub async fn get(&self, id: i64, auth_token: &str) -> Result<DoctorDetail, AppError> {
        debug!("Fetching doctor {}", id);

        self.supabase
            .select_one(
                TABLE,
                &format!("id=eq.{}&select=*,facility:facilities(*)", id),
                auth_token,
            )
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Doctor {} not found", id)))
    }

    pub async fn exists(&self, id: i64, auth_token: &str) -> Result<bool, AppError> {
        let row: Option<Value> = self
            .supabase
            .select_one(TABLE, &format!("id=eq.{}&select=id", id), auth_token)
            .await?;
        Ok(row.is_some())
    }

    async fn check_facility(&self, request: &DoctorRequest, auth_token: &str) -> Result<(), AppError> {
        if let Some(facility_id) = request.facility_id {
            if !self.facilities.exists(facility_id, auth_token).await? {
                return Err(ValidationErrors::single(
                    "facility_id",
                    "The selected facility id is invalid.",
                )
                .into());
            }
        }
        Ok(())
    }

    pub async fn create(&self, request: DoctorRequest, auth_token: &str) -> Result<Doctor, AppError> {
        request.validate(true)?;
        self.check_facility(&request, auth_token).await?;

        let rows: Vec<Doctor> = self
            .supabase
            .insert(TABLE, auth_token, json!(request))
            .await?;
        let doctor = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("Insert returned no doctor".to_string()))?;

        info!("Created doctor {}", doctor.id);
        Ok(doctor)
    }

    pub async fn update(&self, id: i64, request: DoctorRequest, auth_token: &str) -> Result<Doctor, AppError> {
        request.validate(false)?;
        self.check_facility(&request, auth_token).await?;

        let rows: Vec<Doctor> = self
            .supabase
            .update(TABLE, &format!("id=eq.{}", id), auth_token, json!(request))
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("Doctor {} not found", id)))
    }

    pub async fn delete(&self, id: i64, auth_token: &str) -> Result<(), AppError> {
        let rows: Vec<Value> = self
            .supabase
            .delete(TABLE, &format!("id=eq.{}", id), auth_token)
            .await?;

        if rows.is_empty() {
            return Err(AppError::NotFound(format!("Doctor {} not found", id)));
        }
        info!("Deleted doctor {}", id);
        Ok(())
    }
}
