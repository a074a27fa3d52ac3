pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Doctor, HourSlot, WorkingHours, WORKING_HOURS};
pub use services::{compute_availability, hour_bucket, AvailabilityService, DoctorService};
