use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use doctor_cell::Doctor;
use patient_cell::models::PatientSummary;
use shared_models::validation::ValidationErrors;
use shared_utils::validation::{date, max_length, required};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: i64,
    pub patient_id: i64,
    pub history: Option<String>,
    pub allergies: Option<String>,
    pub chronic_conditions: Option<String>,
    pub treatments: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalRecordDetail {
    #[serde(flatten)]
    pub record: MedicalRecord,
    #[serde(default)]
    pub patient: Option<PatientSummary>,
}

/// Free-text sections of a record. `patient_id` is only read on create.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicalRecordRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chronic_conditions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatments: Option<String>,
}

impl MedicalRecordRequest {
    pub fn require_patient(&self) -> Result<i64, ValidationErrors> {
        self.patient_id
            .ok_or_else(|| ValidationErrors::single("patient_id", "The patient id field is required."))
    }

    /// Drops `patient_id`; a record never moves to another patient.
    pub fn into_sections(self) -> MedicalRecordRequest {
        MedicalRecordRequest {
            patient_id: None,
            ..self
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MedicalRecordFilters {
    pub patient_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: i64,
    pub doctor_id: i64,
    pub patient_id: i64,
    pub medication: String,
    pub dosage: String,
    pub duration: String,
    pub prescribed_on: NaiveDate,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionDetail {
    #[serde(flatten)]
    pub prescription: Prescription,
    #[serde(default)]
    pub doctor: Option<Doctor>,
    #[serde(default)]
    pub patient: Option<PatientSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrescriptionRequest {
    pub doctor_id: Option<i64>,
    pub patient_id: Option<i64>,
    pub medication: Option<String>,
    pub dosage: Option<String>,
    pub duration: Option<String>,
    pub prescribed_on: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PrescriptionChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medication: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prescribed_on: Option<NaiveDate>,
}

impl PrescriptionRequest {
    /// On create every field is required; on update only present fields are checked.
    pub fn validate(&self, creating: bool) -> Result<PrescriptionChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut changes = PrescriptionChanges {
            doctor_id: self.doctor_id,
            patient_id: self.patient_id,
            ..Default::default()
        };

        if creating {
            if self.doctor_id.is_none() {
                errors.add("doctor_id", "The doctor id field is required.");
            }
            if self.patient_id.is_none() {
                errors.add("patient_id", "The patient id field is required.");
            }
        }

        let texts = [
            ("medication", &self.medication, &mut changes.medication),
            ("dosage", &self.dosage, &mut changes.dosage),
            ("duration", &self.duration, &mut changes.duration),
        ];
        for (field, value, slot) in texts {
            if creating || value.is_some() {
                if let Some(v) = required(&mut errors, field, value.as_deref()) {
                    max_length(&mut errors, field, v, 255);
                    *slot = Some(v.trim().to_string());
                }
            }
        }

        if creating || self.prescribed_on.is_some() {
            if let Some(raw) = required(&mut errors, "prescribed_on", self.prescribed_on.as_deref()) {
                changes.prescribed_on = date(&mut errors, "prescribed_on", raw);
            }
        }

        errors.into_result().map(|_| changes)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PrescriptionFilters {
    pub medication: Option<String>,
    pub patient_id: Option<i64>,
    pub doctor_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prescription_create_requires_everything() {
        let errors = PrescriptionRequest::default().validate(true).unwrap_err();
        for field in ["doctor_id", "patient_id", "medication", "dosage", "duration", "prescribed_on"] {
            assert!(errors.has(field), "{} should be required", field);
        }
    }

    #[test]
    fn prescription_update_keeps_present_fields() {
        let request = PrescriptionRequest {
            dosage: Some(" 2 tablets ".to_string()),
            ..Default::default()
        };
        let changes = request.validate(false).unwrap();
        assert_eq!(serde_json::to_value(&changes).unwrap(), json!({ "dosage": "2 tablets" }));
    }

    #[test]
    fn prescription_date_must_parse() {
        let request = PrescriptionRequest {
            prescribed_on: Some("March 1st".to_string()),
            ..Default::default()
        };
        assert!(request.validate(false).unwrap_err().has("prescribed_on"));
    }

    #[test]
    fn record_sections_never_carry_patient() {
        let request = MedicalRecordRequest {
            patient_id: Some(3),
            allergies: Some("Latex".to_string()),
            ..Default::default()
        };
        assert_eq!(request.require_patient(), Ok(3));
        assert_eq!(
            serde_json::to_value(request.into_sections()).unwrap(),
            json!({ "allergies": "Latex" })
        );
    }

    #[test]
    fn record_detail_reads_embedded_patient() {
        let detail: MedicalRecordDetail = serde_json::from_value(json!({
            "id": 1,
            "patient_id": 3,
            "history": null,
            "allergies": "Latex",
            "chronic_conditions": null,
            "treatments": null,
            "created_at": null,
            "updated_at": null,
            "patient": { "id": 3, "first_name": "Awa", "last_name": "Diallo", "birth_date": "1990-05-12" }
        }))
        .unwrap();
        assert_eq!(detail.record.patient_id, 3);
        assert_eq!(detail.patient.map(|p| p.last_name), Some("Diallo".to_string()));
    }
}
