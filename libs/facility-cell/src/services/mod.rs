pub mod facility;
pub mod nurse;

pub use facility::FacilityService;
pub use nurse::NurseService;
