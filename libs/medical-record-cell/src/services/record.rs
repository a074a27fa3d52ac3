use serde_json::{json, Value};
use tracing::{debug, info, warn};

use patient_cell::PatientService;
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::error::AppError;
use shared_models::pagination::Paginated;
use shared_models::validation::ValidationErrors;
use shared_utils::query::{ListParams, ListQuery};

use crate::models::{MedicalRecord, MedicalRecordDetail, MedicalRecordFilters, MedicalRecordRequest};

const TABLE: &str = "medical_records";
const DETAIL_SELECT: &str = "*,patient:patients(id,first_name,last_name,birth_date)";
const SORTABLE: [&str; 4] = ["id", "patient_id", "created_at", "updated_at"];

fn duplicate_record() -> AppError {
    ValidationErrors::single("patient_id", "This patient already has a medical record.").into()
}

pub struct MedicalRecordService {
    supabase: SupabaseClient,
    patients: PatientService,
}

impl MedicalRecordService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            patients: PatientService::new(config),
        }
    }

    pub async fn list(
        &self,
        filters: &MedicalRecordFilters,
        params: &ListParams,
        auth_token: &str,
    ) -> Result<Paginated<MedicalRecordDetail>, AppError> {
        let mut query = ListQuery::from_params(params, &SORTABLE, "id").select(DETAIL_SELECT);
        if let Some(patient_id) = filters.patient_id {
            query = query.eq("patient_id", patient_id);
        }

        let (rows, total) = self
            .supabase
            .request_with_count::<MedicalRecordDetail>(&query.to_path(TABLE), Some(auth_token))
            .await?;
        let total = total.unwrap_or(rows.len() as u64);

        Ok(Paginated::new(rows, query.page(), query.per_page(), total))
    }

    pub async fn get(&self, id: i64, auth_token: &str) -> Result<MedicalRecordDetail, AppError> {
        debug!("Fetching medical record {}", id);

        self.supabase
            .select_one(TABLE, &format!("id=eq.{}&select={}", id, DETAIL_SELECT), auth_token)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Medical record {} not found", id)))
    }

    pub async fn for_patient(&self, patient_id: i64, auth_token: &str) -> Result<MedicalRecord, AppError> {
        self.supabase
            .select_one(TABLE, &format!("patient_id=eq.{}", patient_id), auth_token)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No medical record for patient {}", patient_id)))
    }

    pub async fn create(&self, request: MedicalRecordRequest, auth_token: &str) -> Result<MedicalRecord, AppError> {
        let patient_id = request.require_patient()?;

        if !self.patients.exists(patient_id, auth_token).await? {
            return Err(ValidationErrors::single("patient_id", "The selected patient id is invalid.").into());
        }

        let existing: Option<Value> = self
            .supabase
            .select_one(TABLE, &format!("patient_id=eq.{}&select=id", patient_id), auth_token)
            .await?;
        if existing.is_some() {
            warn!("Patient {} already has a medical record", patient_id);
            return Err(duplicate_record());
        }

        let mut body = json!(request.into_sections());
        body["patient_id"] = json!(patient_id);

        let rows: Vec<MedicalRecord> = self
            .supabase
            .insert(TABLE, auth_token, body)
            .await
            .map_err(|err| {
                if err.is_conflict() {
                    duplicate_record()
                } else {
                    err.into()
                }
            })?;
        let record = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("Insert returned no medical record".to_string()))?;

        info!("Created medical record {} for patient {}", record.id, patient_id);
        Ok(record)
    }

    pub async fn update(
        &self,
        id: i64,
        request: MedicalRecordRequest,
        auth_token: &str,
    ) -> Result<MedicalRecord, AppError> {
        let rows: Vec<MedicalRecord> = self
            .supabase
            .update(
                TABLE,
                &format!("id=eq.{}", id),
                auth_token,
                json!(request.into_sections()),
            )
            .await?;

        let record = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("Medical record {} not found", id)))?;
        info!("Updated medical record {}", id);
        Ok(record)
    }

    pub async fn delete(&self, id: i64, auth_token: &str) -> Result<(), AppError> {
        let rows: Vec<Value> = self
            .supabase
            .delete(TABLE, &format!("id=eq.{}", id), auth_token)
            .await?;

        if rows.is_empty() {
            return Err(AppError::NotFound(format!("Medical record {} not found", id)));
        }
        info!("Deleted medical record {}", id);
        Ok(())
    }
}
