pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{MedicalRecord, Prescription};
pub use services::{MedicalRecordService, PrescriptionService};
