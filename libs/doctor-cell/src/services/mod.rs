pub mod availability;
pub mod doctor;

pub use availability::{compute_availability, hour_bucket, AvailabilityService};
pub use doctor::DoctorService;
