pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Facility, Nurse};
pub use services::{FacilityService, NurseService};
