use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use doctor_cell::{hour_bucket, DoctorService};
use patient_cell::PatientService;
use shared_config::AppConfig;
use shared_database::{SupabaseClient, SupabaseError};
use shared_models::error::AppError;
use shared_models::pagination::Paginated;
use shared_models::validation::ValidationErrors;
use shared_utils::query::{ListParams, ListQuery};
use shared_utils::validation::parse_date;

use crate::models::{
    invalid_date_time, parse_status_field, Appointment, AppointmentChanges, AppointmentDetail,
    AppointmentError, AppointmentFilters, AppointmentRequest, AppointmentStatus, DateTimeInput,
};
use crate::services::conflict::ConflictDetectionService;

const TABLE: &str = "appointments";
const DETAIL_SELECT: &str = "*,doctor:doctors(*),patient:patients(*)";
const SORTABLE: [&str; 5] = ["id", "scheduled_at", "status", "doctor_id", "patient_id"];
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn date_time_field(input: &DateTimeInput<'_>) -> &'static str {
    match input {
        DateTimeInput::Combined(_) => "scheduled_at",
        DateTimeInput::TimeOnly(_) => "time",
        DateTimeInput::Split { .. } | DateTimeInput::DateOnly(_) => "date",
    }
}

fn filter_date(errors: &mut ValidationErrors, field: &str, raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw.map(str::trim).filter(|r| !r.is_empty())?;
    let parsed = parse_date(raw);
    if parsed.is_none() {
        errors.add(field, format!("The {} does not match the format Y-m-d.", field));
    }
    parsed
}

fn start_of(date: NaiveDate) -> String {
    date.and_time(NaiveTime::MIN).format(DATETIME_FORMAT).to_string()
}

fn start_of_next(date: NaiveDate) -> Result<String, AppointmentError> {
    date.checked_add_days(Days::new(1))
        .map(start_of)
        .ok_or_else(|| ValidationErrors::single("date", "The date is out of range.").into())
}

/// Maps a unique violation from the slot index onto the scheduling conflict.
fn slot_taken_on_conflict(err: SupabaseError, doctor_id: i64, at: NaiveDateTime) -> AppointmentError {
    if err.is_conflict() {
        warn!("Slot index rejected doctor {} at {}", doctor_id, at);
        AppointmentError::SlotTaken {
            doctor_id,
            slot: hour_bucket(at),
        }
    } else {
        AppointmentError::Database(err)
    }
}

/// Appointment write path: validation, referential checks and slot conflicts.
pub struct BookingService {
    supabase: SupabaseClient,
    conflicts: ConflictDetectionService,
    doctors: DoctorService,
    patients: PatientService,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            conflicts: ConflictDetectionService::new(config),
            doctors: DoctorService::new(config),
            patients: PatientService::new(config),
        }
    }

    pub async fn list(
        &self,
        filters: &AppointmentFilters,
        params: &ListParams,
        auth_token: &str,
    ) -> Result<Paginated<AppointmentDetail>, AppointmentError> {
        let mut query = ListQuery::from_params(params, &SORTABLE, "scheduled_at").select(DETAIL_SELECT);
        let mut errors = ValidationErrors::new();

        if let Some(date) = filter_date(&mut errors, "date", filters.date.as_deref()) {
            query = query
                .gte("scheduled_at", start_of(date))
                .lt("scheduled_at", start_of_next(date)?);
        }
        if let Some(from) = filter_date(&mut errors, "from", filters.from.as_deref()) {
            query = query.gte("scheduled_at", start_of(from));
        }
        if let Some(to) = filter_date(&mut errors, "to", filters.to.as_deref()) {
            query = query.lt("scheduled_at", start_of_next(to)?);
        }
        if let Some(doctor_id) = filters.doctor_id {
            query = query.eq("doctor_id", doctor_id);
        }
        if let Some(patient_id) = filters.patient_id {
            query = query.eq("patient_id", patient_id);
        }
        match parse_status_field(filters.status.as_deref()) {
            Ok(Some(status)) => query = query.eq("status", status),
            Ok(None) => {}
            Err(status_errors) => errors.add("status", status_errors.messages("status").join(" ")),
        }
        errors.into_result()?;

        let (rows, total) = self
            .supabase
            .request_with_count::<AppointmentDetail>(&query.to_path(TABLE), Some(auth_token))
            .await?;
        let total = total.unwrap_or(rows.len() as u64);

        Ok(Paginated::new(rows, query.page(), query.per_page(), total))
    }

    pub async fn list_for_patient(
        &self,
        patient_id: i64,
        params: &ListParams,
        auth_token: &str,
    ) -> Result<Paginated<AppointmentDetail>, AppointmentError> {
        if !self.patients.exists(patient_id, auth_token).await? {
            return Err(AppointmentError::PatientNotFound(patient_id));
        }
        let filters = AppointmentFilters {
            patient_id: Some(patient_id),
            ..Default::default()
        };
        self.list(&filters, params, auth_token).await
    }

    pub async fn list_for_doctor(
        &self,
        doctor_id: i64,
        params: &ListParams,
        auth_token: &str,
    ) -> Result<Paginated<AppointmentDetail>, AppointmentError> {
        if !self.doctors.exists(doctor_id, auth_token).await? {
            return Err(AppointmentError::DoctorNotFound(doctor_id));
        }
        let filters = AppointmentFilters {
            doctor_id: Some(doctor_id),
            ..Default::default()
        };
        self.list(&filters, params, auth_token).await
    }

    pub async fn get(&self, id: i64, auth_token: &str) -> Result<AppointmentDetail, AppointmentError> {
        debug!("Fetching appointment {}", id);

        self.supabase
            .select_one(TABLE, &format!("id=eq.{}&select={}", id, DETAIL_SELECT), auth_token)
            .await?
            .ok_or(AppointmentError::NotFound(id))
    }

    async fn find(&self, id: i64, auth_token: &str) -> Result<Appointment, AppointmentError> {
        self.supabase
            .select_one(TABLE, &format!("id=eq.{}", id), auth_token)
            .await?
            .ok_or(AppointmentError::NotFound(id))
    }

    async fn ensure_doctor(&self, doctor_id: i64, auth_token: &str) -> Result<(), AppointmentError> {
        if self.doctors.exists(doctor_id, auth_token).await? {
            Ok(())
        } else {
            Err(AppointmentError::DoctorNotFound(doctor_id))
        }
    }

    async fn ensure_patient(&self, patient_id: i64, auth_token: &str) -> Result<(), AppointmentError> {
        if self.patients.exists(patient_id, auth_token).await? {
            Ok(())
        } else {
            Err(AppointmentError::PatientNotFound(patient_id))
        }
    }

    pub async fn create(
        &self,
        request: AppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let fields = request.require_fields()?;

        self.ensure_doctor(fields.doctor_id, auth_token).await?;
        self.ensure_patient(fields.patient_id, auth_token).await?;

        let scheduled_at = fields
            .when
            .resolve(None)
            .ok_or_else(|| invalid_date_time(date_time_field(&fields.when)))?;
        let status = request.parsed_status()?.unwrap_or_default();

        if status.occupies_slot() {
            self.conflicts
                .ensure_free(fields.doctor_id, scheduled_at, None, auth_token)
                .await?;
        }

        let changes = AppointmentChanges {
            doctor_id: Some(fields.doctor_id),
            patient_id: Some(fields.patient_id),
            scheduled_at: Some(scheduled_at),
            reason: request.reason.clone(),
            status: Some(status),
        };

        let rows: Vec<Appointment> = self
            .supabase
            .insert(TABLE, auth_token, json!(changes))
            .await
            .map_err(|err| slot_taken_on_conflict(err, fields.doctor_id, scheduled_at))?;
        let appointment = rows.into_iter().next().ok_or_else(|| {
            AppointmentError::Database(SupabaseError::Api {
                status: 500,
                message: "Insert returned no appointment".to_string(),
            })
        })?;

        info!(
            "Booked appointment {} for doctor {} at {}",
            appointment.id, appointment.doctor_id, appointment.scheduled_at
        );
        Ok(appointment)
    }

    pub async fn update(
        &self,
        id: i64,
        request: AppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.find(id, auth_token).await?;

        let doctor_id = request.doctor_id.unwrap_or(current.doctor_id);
        if doctor_id != current.doctor_id {
            self.ensure_doctor(doctor_id, auth_token).await?;
        }
        if let Some(patient_id) = request.patient_id.filter(|p| *p != current.patient_id) {
            self.ensure_patient(patient_id, auth_token).await?;
        }

        let scheduled_at = match request.date_time_input() {
            Some(input) => input
                .resolve(Some(current.scheduled_at))
                .ok_or_else(|| invalid_date_time(date_time_field(&input)))?,
            None => current.scheduled_at,
        };
        let status = request.parsed_status()?;

        let moved = doctor_id != current.doctor_id || scheduled_at != current.scheduled_at;
        if moved && status.unwrap_or(current.status).occupies_slot() {
            self.conflicts
                .ensure_free(doctor_id, scheduled_at, Some(id), auth_token)
                .await?;
        }

        let changes = AppointmentChanges {
            doctor_id: request.doctor_id,
            patient_id: request.patient_id,
            scheduled_at: (scheduled_at != current.scheduled_at).then_some(scheduled_at),
            reason: request.reason,
            status,
        };

        let rows: Vec<Appointment> = self
            .supabase
            .update(TABLE, &format!("id=eq.{}", id), auth_token, json!(changes))
            .await
            .map_err(|err| slot_taken_on_conflict(err, doctor_id, scheduled_at))?;

        let appointment = rows.into_iter().next().ok_or(AppointmentError::NotFound(id))?;
        info!("Updated appointment {}", id);
        Ok(appointment)
    }

    /// Any status may follow any other. Availability is not re-checked here.
    pub async fn update_status(
        &self,
        id: i64,
        raw_status: Option<&str>,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let status: AppointmentStatus = parse_status_field(raw_status)?
            .ok_or_else(|| ValidationErrors::single("status", "The status field is required."))?;

        let rows: Vec<Appointment> = self
            .supabase
            .update(
                TABLE,
                &format!("id=eq.{}", id),
                auth_token,
                json!({ "status": status }),
            )
            .await
            .map_err(|err| match err {
                SupabaseError::Conflict(message) => {
                    warn!("Reactivating appointment {} hit a taken slot: {}", id, message);
                    AppointmentError::Dependency(AppError::Conflict(format!(
                        "Appointment {} cannot be reactivated: its slot is taken",
                        id
                    )))
                }
                other => AppointmentError::Database(other),
            })?;

        let appointment = rows.into_iter().next().ok_or(AppointmentError::NotFound(id))?;
        info!("Appointment {} is now {}", id, appointment.status);
        Ok(appointment)
    }

    pub async fn delete(&self, id: i64, auth_token: &str) -> Result<(), AppointmentError> {
        let rows: Vec<Value> = self
            .supabase
            .delete(TABLE, &format!("id=eq.{}", id), auth_token)
            .await?;

        if rows.is_empty() {
            return Err(AppointmentError::NotFound(id));
        }
        info!("Deleted appointment {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_time_errors_point_at_the_supplied_field() {
        assert_eq!(date_time_field(&DateTimeInput::Combined("x")), "scheduled_at");
        assert_eq!(
            date_time_field(&DateTimeInput::Split { date: "x", time: "y" }),
            "date"
        );
        assert_eq!(date_time_field(&DateTimeInput::TimeOnly("y")), "time");
    }

    #[test]
    fn day_bounds() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(start_of(date), "2024-02-29T00:00:00");
        assert_eq!(start_of_next(date).unwrap(), "2024-03-01T00:00:00");
    }

    #[test]
    fn filter_dates_collect_format_errors() {
        let mut errors = ValidationErrors::new();
        assert!(filter_date(&mut errors, "from", Some("2024-03-01")).is_some());
        assert!(filter_date(&mut errors, "to", Some("")).is_none());
        assert!(filter_date(&mut errors, "date", Some("01/03/2024")).is_none());
        assert!(errors.has("date"));
        assert!(!errors.has("to"));
    }

    #[test]
    fn only_unique_violations_become_slot_conflicts() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 20, 0)
            .unwrap();
        match slot_taken_on_conflict(SupabaseError::Conflict("dup".into()), 7, at) {
            AppointmentError::SlotTaken { doctor_id, slot } => {
                assert_eq!(doctor_id, 7);
                assert_eq!(slot, hour_bucket(at));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            slot_taken_on_conflict(SupabaseError::NotFound("x".into()), 7, at),
            AppointmentError::Database(_)
        ));
    }
}
