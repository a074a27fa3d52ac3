pub mod guard;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use guard::require_permission;
pub use models::{NavigationEntry, NavigationSection, Permission};
pub use services::{check_role, has_permission, navigation_for, role_permissions, AllowedRoles};
