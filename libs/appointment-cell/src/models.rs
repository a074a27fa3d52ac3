use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use doctor_cell::Doctor;
use patient_cell::{Patient, PatientError};
use shared_database::SupabaseError;
use shared_models::error::AppError;
use shared_models::validation::ValidationErrors;
use shared_utils::validation::{parse_date, parse_datetime, parse_time};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "pending" => Some(AppointmentStatus::Pending),
            "confirmed" => Some(AppointmentStatus::Confirmed),
            "completed" => Some(AppointmentStatus::Completed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether an appointment in this status holds its hour slot.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub scheduled_at: NaiveDateTime,
    pub reason: Option<String>,
    #[serde(default)]
    pub status: AppointmentStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Appointment with its doctor and patient embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentDetail {
    #[serde(flatten)]
    pub appointment: Appointment,
    #[serde(default)]
    pub doctor: Option<Doctor>,
    #[serde(default)]
    pub patient: Option<Patient>,
}

/// Body of create and update. The date-time is either `scheduled_at` or `date` plus `time`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentRequest {
    pub doctor_id: Option<i64>,
    pub patient_id: Option<i64>,
    pub scheduled_at: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub reason: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeInput<'a> {
    Combined(&'a str),
    Split { date: &'a str, time: &'a str },
    DateOnly(&'a str),
    TimeOnly(&'a str),
}

impl DateTimeInput<'_> {
    /// Resolves the input, filling a missing half from `current` when one is given.
    pub fn resolve(&self, current: Option<NaiveDateTime>) -> Option<NaiveDateTime> {
        match *self {
            DateTimeInput::Combined(raw) => parse_datetime(raw),
            DateTimeInput::Split { date, time } => Some(parse_date(date)?.and_time(parse_time(time)?)),
            DateTimeInput::DateOnly(date) => Some(parse_date(date)?.and_time(current?.time())),
            DateTimeInput::TimeOnly(time) => Some(current?.date().and_time(parse_time(time)?)),
        }
    }
}

/// Required identifiers and the raw date-time of a new appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredFields<'a> {
    pub doctor_id: i64,
    pub patient_id: i64,
    pub when: DateTimeInput<'a>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl AppointmentRequest {
    pub fn date_time_input(&self) -> Option<DateTimeInput<'_>> {
        if let Some(raw) = non_blank(&self.scheduled_at) {
            return Some(DateTimeInput::Combined(raw));
        }
        match (non_blank(&self.date), non_blank(&self.time)) {
            (Some(date), Some(time)) => Some(DateTimeInput::Split { date, time }),
            (Some(date), None) => Some(DateTimeInput::DateOnly(date)),
            (None, Some(time)) => Some(DateTimeInput::TimeOnly(time)),
            (None, None) => None,
        }
    }

    /// Presence of doctor, patient and a complete date-time.
    pub fn require_fields(&self) -> Result<RequiredFields<'_>, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.doctor_id.is_none() {
            errors.add("doctor_id", "The doctor id field is required.");
        }
        if self.patient_id.is_none() {
            errors.add("patient_id", "The patient id field is required.");
        }

        let when = match self.date_time_input() {
            Some(DateTimeInput::DateOnly(_)) => {
                errors.add("time", "The time field is required when date is present.");
                None
            }
            Some(DateTimeInput::TimeOnly(_)) => {
                errors.add("date", "The date field is required when time is present.");
                None
            }
            Some(input) => Some(input),
            None => {
                errors.add("scheduled_at", "The scheduled at field is required.");
                None
            }
        };

        match (self.doctor_id, self.patient_id, when) {
            (Some(doctor_id), Some(patient_id), Some(when)) if errors.is_empty() => Ok(RequiredFields {
                doctor_id,
                patient_id,
                when,
            }),
            _ => Err(errors),
        }
    }

    pub fn parsed_status(&self) -> Result<Option<AppointmentStatus>, ValidationErrors> {
        parse_status_field(self.status.as_deref())
    }
}

pub fn parse_status_field(raw: Option<&str>) -> Result<Option<AppointmentStatus>, ValidationErrors> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => AppointmentStatus::parse(raw)
            .map(Some)
            .ok_or_else(|| ValidationErrors::single("status", "The selected status is invalid.")),
    }
}

pub fn invalid_date_time(field: &str) -> ValidationErrors {
    ValidationErrors::single(field, "The scheduled at is not a valid date-time.")
}

/// Columns written on create or update.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppointmentChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppointmentFilters {
    pub date: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub doctor_id: Option<i64>,
    pub patient_id: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Appointment {0} not found")]
    NotFound(i64),

    #[error("Doctor {0} not found")]
    DoctorNotFound(i64),

    #[error("Patient {0} not found")]
    PatientNotFound(i64),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Doctor {doctor_id} already has an appointment in the {slot} slot")]
    SlotTaken { doctor_id: i64, slot: NaiveDateTime },

    #[error("Database error: {0}")]
    Database(#[from] SupabaseError),

    #[error(transparent)]
    Dependency(#[from] AppError),
}

impl From<PatientError> for AppointmentError {
    fn from(err: PatientError) -> Self {
        AppointmentError::Dependency(err.into())
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound(_)
            | AppointmentError::DoctorNotFound(_)
            | AppointmentError::PatientNotFound(_) => AppError::NotFound(err.to_string()),
            AppointmentError::Validation(errors) => AppError::Validation(errors),
            AppointmentError::SlotTaken { .. } => AppError::Conflict(err.to_string()),
            AppointmentError::Database(err) => AppError::from(err),
            AppointmentError::Dependency(err) => err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let errors = AppointmentRequest::default().require_fields().unwrap_err();
        assert!(errors.has("doctor_id"));
        assert!(errors.has("patient_id"));
        assert!(errors.has("scheduled_at"));
    }

    #[test]
    fn date_without_time_is_incomplete_on_create() {
        let request = AppointmentRequest {
            doctor_id: Some(7),
            patient_id: Some(1),
            date: Some("2024-03-01".to_string()),
            ..Default::default()
        };
        assert!(request.require_fields().unwrap_err().has("time"));
    }

    #[test]
    fn split_and_combined_inputs_resolve_alike() {
        let combined = DateTimeInput::Combined("2024-03-01 09:30");
        let split = DateTimeInput::Split {
            date: "2024-03-01",
            time: "09:30",
        };
        assert_eq!(combined.resolve(None), Some(at(9, 30)));
        assert_eq!(split.resolve(None), Some(at(9, 30)));
        assert_eq!(DateTimeInput::Combined("tomorrow").resolve(None), None);
    }

    #[test]
    fn partial_input_keeps_current_half() {
        let current = at(9, 0);
        assert_eq!(DateTimeInput::TimeOnly("14:00").resolve(Some(current)), Some(at(14, 0)));
        assert_eq!(
            DateTimeInput::DateOnly("2024-03-02").resolve(Some(current)),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap().and_hms_opt(9, 0, 0)
        );
        assert_eq!(DateTimeInput::TimeOnly("14:00").resolve(None), None);
    }

    #[test]
    fn status_values() {
        assert_eq!(parse_status_field(Some("confirmed")), Ok(Some(AppointmentStatus::Confirmed)));
        assert_eq!(parse_status_field(None), Ok(None));
        assert!(parse_status_field(Some("archived")).unwrap_err().has("status"));
        assert!(!AppointmentStatus::Cancelled.occupies_slot());
        assert!(AppointmentStatus::Pending.occupies_slot());
    }

    #[test]
    fn slot_taken_is_a_conflict() {
        let err = AppointmentError::SlotTaken {
            doctor_id: 7,
            slot: at(9, 0),
        };
        assert_matches!(AppError::from(err), AppError::Conflict(_));
        assert_matches!(
            AppError::from(AppointmentError::DoctorNotFound(7)),
            AppError::NotFound(_)
        );
    }
}
