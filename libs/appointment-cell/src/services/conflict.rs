use chrono::{Duration, NaiveDateTime};
use reqwest::Method;
use tracing::{debug, warn};

use doctor_cell::hour_bucket;
use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{Appointment, AppointmentError};

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// True when `existing` holds the same doctor's clock hour as `at`.
///
/// `exclude` names the appointment being edited, which never conflicts with itself.
pub fn is_conflicting(existing: &Appointment, doctor_id: i64, at: NaiveDateTime, exclude: Option<i64>) -> bool {
    existing.doctor_id == doctor_id
        && existing.status.occupies_slot()
        && Some(existing.id) != exclude
        && hour_bucket(existing.scheduled_at) == hour_bucket(at)
}

pub struct ConflictDetectionService {
    supabase: SupabaseClient,
}

impl ConflictDetectionService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// First appointment occupying the doctor's hour slot around `at`, if any.
    pub async fn find_conflict(
        &self,
        doctor_id: i64,
        at: NaiveDateTime,
        exclude: Option<i64>,
        auth_token: &str,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let slot = hour_bucket(at);
        let mut path = format!(
            "/rest/v1/appointments?select=*&doctor_id=eq.{}&status=neq.cancelled&scheduled_at=gte.{}&scheduled_at=lt.{}",
            doctor_id,
            slot.format(DATETIME_FORMAT),
            (slot + Duration::hours(1)).format(DATETIME_FORMAT),
        );
        if let Some(id) = exclude {
            path.push_str(&format!("&id=neq.{}", id));
        }

        debug!("Checking doctor {} for conflicts at {}", doctor_id, slot);

        let rows: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let conflict = rows
            .into_iter()
            .find(|existing| is_conflicting(existing, doctor_id, at, exclude));

        if let Some(existing) = &conflict {
            warn!(
                "Doctor {} already booked at {} by appointment {}",
                doctor_id, slot, existing.id
            );
        }

        Ok(conflict)
    }

    /// Errors with `SlotTaken` when the slot is held.
    pub async fn ensure_free(
        &self,
        doctor_id: i64,
        at: NaiveDateTime,
        exclude: Option<i64>,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        match self.find_conflict(doctor_id, at, exclude, auth_token).await? {
            Some(_) => Err(AppointmentError::SlotTaken {
                doctor_id,
                slot: hour_bucket(at),
            }),
            None => Ok(()),
        }
    }
}
