use chrono::Local;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::pagination::Paginated;
use shared_models::validation::ValidationErrors;
use shared_utils::query::{ListParams, ListQuery};
use shared_utils::validation::parse_date;

use crate::models::{
    Patient, PatientDetail, PatientError, PatientFilters, PatientRequest, PatientSummary,
};

const TABLE: &str = "patients";
const SORTABLE: [&str; 5] = ["id", "last_name", "first_name", "birth_date", "created_at"];
const SEARCH_LIMIT: u32 = 10;
const DETAIL_SELECT: &str = "*,medical_record:medical_records(*),appointments(*,doctor:doctors(id,first_name,last_name,specialty)),prescriptions(*,doctor:doctors(id,first_name,last_name))";

pub struct PatientService {
    supabase: SupabaseClient,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list(
        &self,
        filters: &PatientFilters,
        params: &ListParams,
        auth_token: &str,
    ) -> Result<Paginated<Patient>, PatientError> {
        let mut query = ListQuery::from_params(params, &SORTABLE, "last_name");

        if let Some(last_name) = non_blank(&filters.last_name) {
            query = query.ilike("last_name", last_name);
        }
        if let Some(first_name) = non_blank(&filters.first_name) {
            query = query.ilike("first_name", first_name);
        }
        if let Some(raw) = non_blank(&filters.birth_date) {
            let birth_date = parse_date(raw).ok_or_else(|| {
                ValidationErrors::single("birth_date", "The birth date is not a valid date.")
            })?;
            query = query.eq("birth_date", birth_date);
        }
        if let Some(term) = non_blank(&filters.search) {
            query = query.any_ilike(&["first_name", "last_name"], term);
        }

        let (rows, total) = self
            .supabase
            .request_with_count::<Patient>(&query.to_path(TABLE), Some(auth_token))
            .await?;
        let total = total.unwrap_or(rows.len() as u64);

        Ok(Paginated::new(rows, query.page(), query.per_page(), total))
    }

    /// Up to ten patients whose first or last name contains `term`.
    pub async fn search(&self, term: Option<&str>, auth_token: &str) -> Result<Vec<PatientSummary>, PatientError> {
        let params = ListParams {
            per_page: Some(SEARCH_LIMIT),
            ..Default::default()
        };
        let mut query = ListQuery::from_params(&params, &SORTABLE, "last_name")
            .select("id,first_name,last_name,birth_date");
        if let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) {
            query = query.any_ilike(&["first_name", "last_name"], term);
        }

        debug!("Searching patients: {}", query.to_path(TABLE));
        let rows = self
            .supabase
            .request(Method::GET, &query.to_path(TABLE), Some(auth_token), None)
            .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i64, auth_token: &str) -> Result<Patient, PatientError> {
        self.supabase
            .select_one(TABLE, &format!("id=eq.{}", id), auth_token)
            .await?
            .ok_or(PatientError::NotFound(id))
    }

    pub async fn get_detail(&self, id: i64, auth_token: &str) -> Result<PatientDetail, PatientError> {
        debug!("Fetching patient {} with related records", id);

        let row: Value = self
            .supabase
            .select_one(
                TABLE,
                &format!("id=eq.{}&select={}", id, DETAIL_SELECT),
                auth_token,
            )
            .await?
            .ok_or(PatientError::NotFound(id))?;

        serde_json::from_value(normalize_record_embed(row))
            .map_err(|e| PatientError::Malformed(e.to_string()))
    }

    pub async fn exists(&self, id: i64, auth_token: &str) -> Result<bool, PatientError> {
        let row: Option<Value> = self
            .supabase
            .select_one(TABLE, &format!("id=eq.{}&select=id", id), auth_token)
            .await?;
        Ok(row.is_some())
    }

    pub async fn create(&self, request: PatientRequest, auth_token: &str) -> Result<Patient, PatientError> {
        let changes = request.validate(true, Local::now().date_naive())?;

        let rows: Vec<Patient> = self
            .supabase
            .insert(TABLE, auth_token, json!(changes))
            .await?;
        let patient = rows
            .into_iter()
            .next()
            .ok_or_else(|| PatientError::Malformed("Insert returned no patient".to_string()))?;

        info!("Created patient {} ({})", patient.id, patient.full_name());
        Ok(patient)
    }

    pub async fn update(
        &self,
        id: i64,
        request: PatientRequest,
        auth_token: &str,
    ) -> Result<Patient, PatientError> {
        let changes = request.validate(false, Local::now().date_naive())?;

        let rows: Vec<Patient> = self
            .supabase
            .update(TABLE, &format!("id=eq.{}", id), auth_token, json!(changes))
            .await?;

        let patient = rows.into_iter().next().ok_or(PatientError::NotFound(id))?;
        info!("Updated patient {}", patient.id);
        Ok(patient)
    }

    pub async fn delete(&self, id: i64, auth_token: &str) -> Result<(), PatientError> {
        let rows: Vec<Value> = self
            .supabase
            .delete(TABLE, &format!("id=eq.{}", id), auth_token)
            .await?;

        if rows.is_empty() {
            return Err(PatientError::NotFound(id));
        }
        info!("Deleted patient {}", id);
        Ok(())
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// PostgREST embeds the one-to-one record as an object or, on older servers, a one-element array.
fn normalize_record_embed(mut row: Value) -> Value {
    if let Some(Value::Array(items)) = row.get("medical_record") {
        let first = items.first().cloned().unwrap_or(Value::Null);
        row["medical_record"] = first;
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_embed_array_becomes_object() {
        let row = normalize_record_embed(json!({ "id": 1, "medical_record": [{ "id": 9 }] }));
        assert_eq!(row["medical_record"]["id"], 9);

        let row = normalize_record_embed(json!({ "id": 1, "medical_record": [] }));
        assert!(row["medical_record"].is_null());

        let row = normalize_record_embed(json!({ "id": 1, "medical_record": { "id": 3 } }));
        assert_eq!(row["medical_record"]["id"], 3);
    }

    #[test]
    fn blank_filters_are_ignored() {
        assert_eq!(non_blank(&Some("  ".to_string())), None);
        assert_eq!(non_blank(&Some(" Du ".to_string())), Some("Du"));
        assert_eq!(non_blank(&None), None);
    }
}
