use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use facility_cell::Facility;
use shared_models::validation::ValidationErrors;
use shared_utils::validation::{max_length, required};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub specialty: Option<String>,
    pub facility_id: Option<i64>,
    pub account_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorDetail {
    #[serde(flatten)]
    pub doctor: Doctor,
    #[serde(default)]
    pub facility: Option<Facility>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoctorRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

impl DoctorRequest {
    pub fn validate(&self, creating: bool) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
            if creating || value.is_some() {
                if let Some(v) = required(&mut errors, field, value.as_deref()) {
                    max_length(&mut errors, field, v, 255);
                }
            }
        }
        if let Some(specialty) = &self.specialty {
            max_length(&mut errors, "specialty", specialty, 255);
        }

        errors.into_result()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DoctorFilters {
    pub name: Option<String>,
    pub specialty: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AvailabilityQuery {
    pub date: Option<String>,
}

/// Daily consultation window, in whole hours. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingHours {
    pub start: u32,
    pub end: u32,
}

impl WorkingHours {
    pub fn hours(&self) -> impl Iterator<Item = u32> {
        self.start..self.end
    }
}

pub const WORKING_HOURS: WorkingHours = WorkingHours { start: 8, end: 18 };

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourSlot {
    #[serde(rename = "heure")]
    pub hour: String,
    #[serde(rename = "disponible")]
    pub available: bool,
}

/// Start time of a booked appointment, as read for availability.
#[derive(Debug, Clone, Deserialize)]
pub struct BookedSlot {
    pub scheduled_at: NaiveDateTime,
}
