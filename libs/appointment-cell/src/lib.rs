pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Appointment, AppointmentError, AppointmentStatus};
pub use services::{BookingService, ConflictDetectionService};
