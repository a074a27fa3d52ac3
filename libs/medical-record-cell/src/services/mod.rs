pub mod prescription;
pub mod record;

pub use prescription::PrescriptionService;
pub use record::MedicalRecordService;
