use serde_json::{json, Value};
use tracing::{debug, info};

use doctor_cell::DoctorService;
use patient_cell::PatientService;
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::error::AppError;
use shared_models::pagination::Paginated;
use shared_models::validation::ValidationErrors;
use shared_utils::query::{ListParams, ListQuery};

use crate::models::{
    Prescription, PrescriptionChanges, PrescriptionDetail, PrescriptionFilters, PrescriptionRequest,
};

const TABLE: &str = "prescriptions";
const DETAIL_SELECT: &str =
    "*,doctor:doctors(*),patient:patients(id,first_name,last_name,birth_date)";
const SORTABLE: [&str; 4] = ["id", "prescribed_on", "medication", "created_at"];

pub struct PrescriptionService {
    supabase: SupabaseClient,
    doctors: DoctorService,
    patients: PatientService,
}

impl PrescriptionService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            doctors: DoctorService::new(config),
            patients: PatientService::new(config),
        }
    }

    pub async fn list(
        &self,
        filters: &PrescriptionFilters,
        params: &ListParams,
        auth_token: &str,
    ) -> Result<Paginated<PrescriptionDetail>, AppError> {
        let mut query = ListQuery::from_params(params, &SORTABLE, "prescribed_on").select(DETAIL_SELECT);

        if let Some(medication) = filters.medication.as_deref().filter(|m| !m.trim().is_empty()) {
            query = query.ilike("medication", medication);
        }
        if let Some(patient_id) = filters.patient_id {
            query = query.eq("patient_id", patient_id);
        }
        if let Some(doctor_id) = filters.doctor_id {
            query = query.eq("doctor_id", doctor_id);
        }

        let (rows, total) = self
            .supabase
            .request_with_count::<PrescriptionDetail>(&query.to_path(TABLE), Some(auth_token))
            .await?;
        let total = total.unwrap_or(rows.len() as u64);

        Ok(Paginated::new(rows, query.page(), query.per_page(), total))
    }

    pub async fn get(&self, id: i64, auth_token: &str) -> Result<PrescriptionDetail, AppError> {
        debug!("Fetching prescription {}", id);

        self.supabase
            .select_one(TABLE, &format!("id=eq.{}&select={}", id, DETAIL_SELECT), auth_token)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Prescription {} not found", id)))
    }

    /// Supplied doctor and patient must exist.
    async fn check_references(&self, changes: &PrescriptionChanges, auth_token: &str) -> Result<(), AppError> {
        let mut errors = ValidationErrors::new();

        if let Some(doctor_id) = changes.doctor_id {
            if !self.doctors.exists(doctor_id, auth_token).await? {
                errors.add("doctor_id", "The selected doctor id is invalid.");
            }
        }
        if let Some(patient_id) = changes.patient_id {
            if !self.patients.exists(patient_id, auth_token).await? {
                errors.add("patient_id", "The selected patient id is invalid.");
            }
        }

        Ok(errors.into_result()?)
    }

    pub async fn create(&self, request: PrescriptionRequest, auth_token: &str) -> Result<Prescription, AppError> {
        let changes = request.validate(true)?;
        self.check_references(&changes, auth_token).await?;

        let rows: Vec<Prescription> = self
            .supabase
            .insert(TABLE, auth_token, json!(changes))
            .await?;
        let prescription = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("Insert returned no prescription".to_string()))?;

        info!(
            "Doctor {} prescribed {} to patient {}",
            prescription.doctor_id, prescription.medication, prescription.patient_id
        );
        Ok(prescription)
    }

    pub async fn update(
        &self,
        id: i64,
        request: PrescriptionRequest,
        auth_token: &str,
    ) -> Result<Prescription, AppError> {
        let changes = request.validate(false)?;
        self.check_references(&changes, auth_token).await?;

        let rows: Vec<Prescription> = self
            .supabase
            .update(TABLE, &format!("id=eq.{}", id), auth_token, json!(changes))
            .await?;

        let prescription = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("Prescription {} not found", id)))?;
        info!("Updated prescription {}", id);
        Ok(prescription)
    }

    pub async fn delete(&self, id: i64, auth_token: &str) -> Result<(), AppError> {
        let rows: Vec<Value> = self
            .supabase
            .delete(TABLE, &format!("id=eq.{}", id), auth_token)
            .await?;

        if rows.is_empty() {
            return Err(AppError::NotFound(format!("Prescription {} not found", id)));
        }
        info!("Deleted prescription {}", id);
        Ok(())
    }
}
