pub mod navigation;
pub mod permissions;

pub use navigation::{filter_navigation, navigation_for};
pub use permissions::{check_role, grants, has_permission, role_permissions, AllowedRoles};
