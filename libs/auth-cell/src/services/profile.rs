use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info};

use doctor_cell::models::DoctorRequest;
use doctor_cell::DoctorService;
use facility_cell::models::NurseRequest;
use facility_cell::NurseService;
use patient_cell::models::PatientRequest;
use patient_cell::PatientService;
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::validation::ValidationErrors;

use crate::models::{LinkedProfile, ProfileKind};

/// Reads and edits the doctor, nurse or patient row linked to the calling account.
pub struct ProfileService {
    supabase: SupabaseClient,
    doctors: DoctorService,
    nurses: NurseService,
    patients: PatientService,
}

impl ProfileService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            doctors: DoctorService::new(config),
            nurses: NurseService::new(config),
            patients: PatientService::new(config),
        }
    }

    pub async fn linked(&self, user: &User, auth_token: &str) -> Result<Option<LinkedProfile>, AppError> {
        let Some(kind) = user.role.and_then(ProfileKind::for_role) else {
            return Ok(None);
        };
        debug!("Looking up the {} profile of account {}", kind, user.id);

        let row: Option<Value> = self
            .supabase
            .select_one(kind.table(), &format!("account_id=eq.{}", user.id), auth_token)
            .await?;

        Ok(row.map(|row| LinkedProfile { kind, row }))
    }

    /// Applies the profile's own update rules. The link and the facility
    /// assignment are left to `manage_users`.
    pub async fn update(&self, user: &User, body: Value, auth_token: &str) -> Result<LinkedProfile, AppError> {
        let current = self
            .linked(user, auth_token)
            .await?
            .ok_or_else(|| AppError::NotFound("No profile is linked to this account".to_string()))?;
        let id = current
            .id()
            .ok_or_else(|| AppError::Internal(format!("{} profile row without id", current.kind)))?;

        let row = match current.kind {
            ProfileKind::Doctor => {
                let request = DoctorRequest {
                    account_id: None,
                    facility_id: None,
                    ..parse_body(body)?
                };
                let doctor = self.doctors.update(id, request, auth_token).await?;
                json!(doctor)
            }
            ProfileKind::Nurse => {
                let request = NurseRequest {
                    account_id: None,
                    facility_id: None,
                    ..parse_body(body)?
                };
                let nurse = self.nurses.update(id, request, auth_token).await?;
                json!(nurse)
            }
            ProfileKind::Patient => {
                let request = PatientRequest {
                    account_id: None,
                    ..parse_body(body)?
                };
                let patient = self.patients.update(id, request, auth_token).await?;
                json!(patient)
            }
        };

        info!("Account {} updated its {} profile {}", user.id, current.kind, id);
        Ok(LinkedProfile {
            kind: current.kind,
            row,
        })
    }
}

fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, AppError> {
    serde_json::from_value(body)
        .map_err(|e| AppError::Validation(ValidationErrors::single("profile", e.to_string())))
}
