use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared_models::validation::ValidationErrors;
use shared_utils::validation::{max_length, required};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facility {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A doctor or nurse as embedded in a facility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityDetail {
    #[serde(flatten)]
    pub facility: Facility,
    #[serde(default)]
    pub doctors: Vec<StaffMember>,
    #[serde(default)]
    pub nurses: Vec<StaffMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nurse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub facility_id: Option<i64>,
    pub account_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of both create and update; on update only present fields are checked and written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FacilityRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl FacilityRequest {
    pub fn validate(&self, creating: bool) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for (field, value) in [("name", &self.name), ("address", &self.address)] {
            if creating || value.is_some() {
                if let Some(v) = required(&mut errors, field, value.as_deref()) {
                    max_length(&mut errors, field, v, 255);
                }
            }
        }
        if let Some(phone) = &self.phone {
            max_length(&mut errors, "phone", phone, 20);
        }

        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NurseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

impl NurseRequest {
    pub fn validate(&self, creating: bool) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
            if creating || value.is_some() {
                if let Some(v) = required(&mut errors, field, value.as_deref()) {
                    max_length(&mut errors, field, v, 255);
                }
            }
        }

        errors.into_result()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FacilityFilters {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NurseFilters {
    pub name: Option<String>,
    pub facility_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facility_create_requires_name_and_address() {
        let errors = FacilityRequest::default().validate(true).unwrap_err();
        assert!(errors.has("name"));
        assert!(errors.has("address"));
    }

    #[test]
    fn facility_update_checks_present_fields_only() {
        let request = FacilityRequest {
            phone: Some("0472000000".to_string()),
            ..Default::default()
        };
        assert!(request.validate(false).is_ok());

        let blank = FacilityRequest {
            name: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(blank.validate(false).unwrap_err().has("name"));
    }

    #[test]
    fn facility_detail_reads_embedded_staff() {
        let detail: FacilityDetail = serde_json::from_value(serde_json::json!({
            "id": 1,
            "name": "Clinique du Parc",
            "address": "Lyon",
            "phone": null,
            "created_at": "2024-01-01T00:00:00+00:00",
            "updated_at": null,
            "doctors": [{ "id": 7, "first_name": "Jean", "last_name": "Martin", "specialty": "Cardiology" }],
            "nurses": []
        }))
        .unwrap();

        assert_eq!(detail.facility.name, "Clinique du Parc");
        assert_eq!(detail.doctors[0].id, 7);
        assert!(detail.nurses.is_empty());
    }

    #[test]
    fn nurse_update_serializes_only_present_fields() {
        let request = NurseRequest {
            facility_id: Some(2),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "facility_id": 2 })
        );
    }
}
