pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{AuthError, LinkedProfile, LoginRequest, ProfileKind, RegisterRequest};
pub use services::{AuthService, ProfileService};
