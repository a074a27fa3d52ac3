pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Patient, PatientError, Sex};
pub use services::PatientService;
