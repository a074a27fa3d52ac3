use std::collections::BTreeSet;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use reqwest::Method;
use tracing::debug;

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::error::AppError;

use crate::models::{BookedSlot, HourSlot, WorkingHours, WORKING_HOURS};
use crate::services::DoctorService;

/// Start of the clock hour containing `at`.
pub fn hour_bucket(at: NaiveDateTime) -> NaiveDateTime {
    at.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}

/// One slot per working hour of `date`, marked unavailable when any booking starts in it.
///
/// Bookings on other dates or outside the window are ignored.
pub fn compute_availability(
    window: WorkingHours,
    date: NaiveDate,
    booked: &[NaiveDateTime],
) -> Vec<HourSlot> {
    let occupied: BTreeSet<u32> = booked
        .iter()
        .filter(|at| at.date() == date)
        .map(|at| hour_bucket(*at).hour())
        .collect();

    window
        .hours()
        .map(|hour| HourSlot {
            hour: format!("{:02}:00", hour),
            available: !occupied.contains(&hour),
        })
        .collect()
}

pub struct AvailabilityService {
    supabase: SupabaseClient,
    doctors: DoctorService,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            doctors: DoctorService::new(config),
        }
    }

    pub async fn for_date(
        &self,
        doctor_id: i64,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<HourSlot>, AppError> {
        if !self.doctors.exists(doctor_id, auth_token).await? {
            return Err(AppError::NotFound(format!("Doctor {} not found", doctor_id)));
        }

        let booked = self.booked_starts(doctor_id, date, auth_token).await?;
        debug!(
            "Doctor {} has {} booking(s) on {}",
            doctor_id,
            booked.len(),
            date
        );

        Ok(compute_availability(WORKING_HOURS, date, &booked))
    }

    /// Start times of the doctor's non-cancelled appointments in `[date, date + 1)`.
    async fn booked_starts(
        &self,
        doctor_id: i64,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<NaiveDateTime>, AppError> {
        let day_start = date.and_time(NaiveTime::MIN);
        let next_day = date
            .checked_add_days(Days::new(1))
            .ok_or_else(|| AppError::BadRequest(format!("Date out of range: {}", date)))?;
        let day_end = next_day.and_time(NaiveTime::MIN);

        let path = format!(
            "/rest/v1/appointments?select=scheduled_at&doctor_id=eq.{}&status=neq.cancelled&scheduled_at=gte.{}&scheduled_at=lt.{}&order=scheduled_at.asc",
            doctor_id,
            day_start.format("%Y-%m-%dT%H:%M:%S"),
            day_end.format("%Y-%m-%dT%H:%M:%S"),
        );

        let rows: Vec<BookedSlot> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        Ok(rows.into_iter().map(|row| row.scheduled_at).collect())
    }
}
