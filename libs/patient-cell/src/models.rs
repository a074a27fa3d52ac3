use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use shared_database::SupabaseError;
use shared_models::error::AppError;
use shared_models::validation::ValidationErrors;
use shared_utils::validation::{date, email, max_length, required};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    M,
    F,
}

impl Sex {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "M" => Some(Sex::M),
            "F" => Some(Sex::F),
            _ => None,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::M => f.write_str("M"),
            Sex::F => f.write_str("F"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub sex: Sex,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub account_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Patient with its medical record, appointments and prescriptions embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientDetail {
    #[serde(flatten)]
    pub patient: Patient,
    #[serde(default)]
    pub medical_record: Option<Value>,
    #[serde(default)]
    pub appointments: Vec<Value>,
    #[serde(default)]
    pub prescriptions: Vec<Value>,
}

/// Row returned by the quick search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<String>,
    pub sex: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub account_id: Option<String>,
}

/// Validated columns to write. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatientChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

impl PatientRequest {
    /// On create every required field must be present; on update only present ones are checked.
    pub fn validate(&self, creating: bool, today: NaiveDate) -> Result<PatientChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut changes = PatientChanges::default();

        for (field, value, slot) in [
            ("first_name", &self.first_name, &mut changes.first_name),
            ("last_name", &self.last_name, &mut changes.last_name),
        ] {
            if creating || value.is_some() {
                if let Some(v) = required(&mut errors, field, value.as_deref()) {
                    max_length(&mut errors, field, v, 255);
                    *slot = Some(v.to_string());
                }
            }
        }

        if creating || self.birth_date.is_some() {
            if let Some(raw) = required(&mut errors, "birth_date", self.birth_date.as_deref()) {
                match date(&mut errors, "birth_date", raw) {
                    Some(d) if d > today => errors.add(
                        "birth_date",
                        "The birth date must be a date before or equal to today.",
                    ),
                    Some(d) => changes.birth_date = Some(d),
                    None => {}
                }
            }
        }

        if creating || self.sex.is_some() {
            if let Some(raw) = required(&mut errors, "sex", self.sex.as_deref()) {
                match Sex::parse(raw) {
                    Some(sex) => changes.sex = Some(sex),
                    None => errors.add("sex", "The selected sex is invalid."),
                }
            }
        }

        if let Some(phone) = self.phone.as_deref().map(str::trim) {
            max_length(&mut errors, "phone", phone, 20);
            changes.phone = Some(phone.to_string());
        }

        if let Some(address) = self.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            email(&mut errors, "email", address);
            changes.email = Some(address.to_string());
        }

        changes.address = self.address.clone();
        changes.account_id = self.account_id.clone();

        errors.into_result()?;
        Ok(changes)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PatientFilters {
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub birth_date: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PatientSearchQuery {
    pub term: Option<String>,
}

#[derive(Debug, Error)]
pub enum PatientError {
    #[error("Patient {0} not found")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] SupabaseError),

    #[error("Unexpected response: {0}")]
    Malformed(String),
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound(id) => AppError::NotFound(format!("Patient {} not found", id)),
            PatientError::Validation(errors) => AppError::Validation(errors),
            PatientError::Database(err) => AppError::from(err),
            PatientError::Malformed(msg) => AppError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn valid_request() -> PatientRequest {
        PatientRequest {
            first_name: Some("Awa".to_string()),
            last_name: Some("Diallo".to_string()),
            birth_date: Some("1990-05-12".to_string()),
            sex: Some("F".to_string()),
            phone: Some("0612345678".to_string()),
            email: Some("awa@example.com".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn valid_patient_passes() {
        let changes = valid_request().validate(true, today()).unwrap();
        assert_eq!(changes.sex, Some(Sex::F));
        assert_eq!(changes.birth_date, NaiveDate::from_ymd_opt(1990, 5, 12));
    }

    #[test]
    fn sex_must_be_m_or_f() {
        let request = PatientRequest {
            sex: Some("X".to_string()),
            ..valid_request()
        };
        let errors = request.validate(true, today()).unwrap_err();
        assert_eq!(errors.messages("sex"), ["The selected sex is invalid."]);
    }

    #[test]
    fn birth_date_in_future_is_rejected() {
        let request = PatientRequest {
            birth_date: Some("2024-03-02".to_string()),
            ..valid_request()
        };
        assert!(request.validate(true, today()).unwrap_err().has("birth_date"));
    }

    #[test]
    fn phone_longer_than_twenty_is_rejected() {
        let request = PatientRequest {
            phone: Some("0".repeat(21)),
            ..valid_request()
        };
        assert!(request.validate(true, today()).unwrap_err().has("phone"));
    }

    #[test]
    fn create_lists_every_missing_field() {
        let errors = PatientRequest::default().validate(true, today()).unwrap_err();
        for field in ["first_name", "last_name", "birth_date", "sex"] {
            assert!(errors.has(field), "missing {}", field);
        }
    }

    #[test]
    fn update_only_writes_present_fields() {
        let request = PatientRequest {
            phone: Some("0700000000".to_string()),
            ..Default::default()
        };
        let changes = request.validate(false, today()).unwrap();
        assert_eq!(
            serde_json::to_value(&changes).unwrap(),
            serde_json::json!({ "phone": "0700000000" })
        );
    }

    #[test]
    fn errors_map_onto_responses() {
        assert_matches!(
            AppError::from(PatientError::NotFound(3)),
            AppError::NotFound(msg) if msg == "Patient 3 not found"
        );
        assert_matches!(
            AppError::from(PatientError::Database(SupabaseError::Conflict("dup".to_string()))),
            AppError::Conflict(_)
        );
        assert_matches!(
            AppError::from(PatientError::Malformed("bad row".to_string())),
            AppError::Internal(_)
        );
    }
}
