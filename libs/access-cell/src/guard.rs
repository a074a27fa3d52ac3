use tracing::warn;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::Permission;
use crate::services::grants;

/// Rejects the request with 403 unless the user's role grants `permission`.
pub fn require_permission(user: &User, permission: Permission) -> Result<(), AppError> {
    if grants(user.role, permission) {
        return Ok(());
    }

    warn!(
        "User {} with role {:?} denied {}",
        user.id, user.role, permission
    );
    Err(AppError::Forbidden(format!(
        "Missing permission: {}",
        permission
    )))
}
