use serde_json::json;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::error::AppError;
use shared_models::pagination::Paginated;
use shared_models::validation::ValidationErrors;
use shared_utils::query::{ListParams, ListQuery};

use crate::models::{Nurse, NurseFilters, NurseRequest};
use crate::services::FacilityService;

const TABLE: &str = "nurses";
const SORTABLE: [&str; 4] = ["id", "last_name", "first_name", "created_at"];

pub struct NurseService {
    supabase: SupabaseClient,
    facilities: FacilityService,
}

impl NurseService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            facilities: FacilityService::new(config),
        }
    }

    pub async fn list(
        &self,
        filters: &NurseFilters,
        params: &ListParams,
        auth_token: &str,
    ) -> Result<Paginated<Nurse>, AppError> {
        let mut query = ListQuery::from_params(params, &SORTABLE, "last_name");
        if let Some(name) = filters.name.as_deref().filter(|n| !n.trim().is_empty()) {
            query = query.any_ilike(&["first_name", "last_name"], name);
        }
        if let Some(facility_id) = filters.facility_id {
            query = query.eq("facility_id", facility_id);
        }

        let (rows, total) = self
            .supabase
            .request_with_count::<Nurse>(&query.to_path(TABLE), Some(auth_token))
            .await?;
        let total = total.unwrap_or(rows.len() as u64);

        Ok(Paginated::new(rows, query.page(), query.per_page(), total))
    }

    pub async fn get(&self, id: i64, auth_token: &str) -> Result<Nurse, AppError> {
        debug!("Fetching nurse {}", id);

        self.supabase
            .select_one(TABLE, &format!("id=eq.{}", id), auth_token)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Nurse {} not found", id)))
    }

    async fn check_facility(&self, request: &NurseRequest, auth_token: &str) -> Result<(), AppError> {
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

    pub async fn create(&self, request: NurseRequest, auth_token: &str) -> Result<Nurse, AppError> {
        request.validate(true)?;
        self.check_facility(&request, auth_token).await?;

        let rows: Vec<Nurse> = self
            .supabase
            .insert(TABLE, auth_token, json!(request))
            .await?;
        let nurse = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("Insert returned no nurse".to_string()))?;

        info!("Created nurse {}", nurse.id);
        Ok(nurse)
    }

    pub async fn update(&self, id: i64, request: NurseRequest, auth_token: &str) -> Result<Nurse, AppError> {
        request.validate(false)?;
        self.check_facility(&request, auth_token).await?;

        let rows: Vec<Nurse> = self
            .supabase
            .update(TABLE, &format!("id=eq.{}", id), auth_token, json!(request))
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("Nurse {} not found", id)))
    }

    pub async fn delete(&self, id: i64, auth_token: &str) -> Result<(), AppError> {
        let rows: Vec<Nurse> = self
            .supabase
            .delete(TABLE, &format!("id=eq.{}", id), auth_token)
            .await?;

        if rows.is_empty() {
            return Err(AppError::NotFound(format!("Nurse {} not found", id)));
        }
        info!("Deleted nurse {}", id);
        Ok(())
    }
}
