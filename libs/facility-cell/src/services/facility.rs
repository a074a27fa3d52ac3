use serde_json::json;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::error::AppError;
use shared_models::pagination::Paginated;
use shared_utils::query::{ListParams, ListQuery};

use crate::models::{Facility, FacilityDetail, FacilityFilters, FacilityRequest};

const TABLE: &str = "facilities";
const SORTABLE: [&str; 3] = ["id", "name", "created_at"];

pub struct FacilityService {
    supabase: SupabaseClient,
}

impl FacilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list(
        &self,
        filters: &FacilityFilters,
        params: &ListParams,
        auth_token: &str,
    ) -> Result<Paginated<Facility>, AppError> {
        let mut query = ListQuery::from_params(params, &SORTABLE, "name");
        if let Some(name) = filters.name.as_deref().filter(|n| !n.trim().is_empty()) {
            query = query.ilike("name", name);
        }

        let (rows, total) = self
            .supabase
            .request_with_count::<Facility>(&query.to_path(TABLE), Some(auth_token))
            .await?;
        let total = total.unwrap_or(rows.len() as u64);

        Ok(Paginated::new(rows, query.page(), query.per_page(), total))
    }

    /// Facility with the doctors and nurses attached to it.
    pub async fn get(&self, id: i64, auth_token: &str) -> Result<FacilityDetail, AppError> {
        debug!("Fetching facility {}", id);

        self.supabase
            .select_one(
                TABLE,
                &format!(
                    "id=eq.{}&select=*,doctors(id,first_name,last_name,specialty),nurses(id,first_name,last_name)",
                    id
                ),
                auth_token,
            )
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Facility {} not found", id)))
    }

    pub async fn exists(&self, id: i64, auth_token: &str) -> Result<bool, AppError> {
        let row: Option<serde_json::Value> = self
            .supabase
            .select_one(TABLE, &format!("id=eq.{}&select=id", id), auth_token)
            .await?;
        Ok(row.is_some())
    }

    pub async fn create(&self, request: FacilityRequest, auth_token: &str) -> Result<Facility, AppError> {
        request.validate(true)?;

        let rows: Vec<Facility> = self
            .supabase
            .insert(TABLE, auth_token, json!(request))
            .await?;
        let facility = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("Insert returned no facility".to_string()))?;

        info!("Created facility {}", facility.id);
        Ok(facility)
    }

    pub async fn update(
        &self,
        id: i64,
        request: FacilityRequest,
        auth_token: &str,
    ) -> Result<Facility, AppError> {
        request.validate(false)?;

        let rows: Vec<Facility> = self
            .supabase
            .update(TABLE, &format!("id=eq.{}", id), auth_token, json!(request))
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("Facility {} not found", id)))
    }

    pub async fn delete(&self, id: i64, auth_token: &str) -> Result<(), AppError> {
        let rows: Vec<Facility> = self
            .supabase
            .delete(TABLE, &format!("id=eq.{}", id), auth_token)
            .await?;

        if rows.is_empty() {
            return Err(AppError::NotFound(format!("Facility {} not found", id)));
        }
        info!("Deleted facility {}", id);
        Ok(())
    }
}
