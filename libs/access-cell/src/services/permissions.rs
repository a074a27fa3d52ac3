use shared_models::auth::Role;

use crate::models::Permission;

pub fn role_permissions(role: Role) -> &'static [Permission] {
    match role {
        Role::Admin => &Permission::ALL,
        Role::Doctor => &[
            Permission::ViewPatients,
            Permission::ManageAppointments,
            Permission::ManageMedicalRecords,
        ],
        Role::Nurse => &[
            Permission::ViewPatients,
            Permission::ViewAppointments,
            Permission::ViewMedicalRecords,
            Permission::UpdateMedicalRecords,
        ],
        Role::Staff => &[
            Permission::ViewPatients,
            Permission::ManageAppointments,
            Permission::ViewMedicalRecords,
        ],
        Role::Patient => &[],
    }
}

/// Strict membership of `permission` in the role's list. Unknown strings are never granted.
pub fn has_permission(role: Option<Role>, permission: &str) -> bool {
    match (role, permission.parse::<Permission>()) {
        (Some(role), Ok(permission)) => role_permissions(role).contains(&permission),
        _ => false,
    }
}

/// Membership, widened by `Permission::implied_by`. Used to gate requests.
pub fn grants(role: Option<Role>, permission: Permission) -> bool {
    let Some(role) = role else {
        return false;
    };
    let held = role_permissions(role);
    held.contains(&permission)
        || permission
            .implied_by()
            .iter()
            .any(|stronger| held.contains(stronger))
}

#[derive(Debug, Clone, Copy)]
pub enum AllowedRoles<'a> {
    One(Role),
    Many(&'a [Role]),
}

impl From<Role> for AllowedRoles<'_> {
    fn from(role: Role) -> Self {
        AllowedRoles::One(role)
    }
}

impl<'a> From<&'a [Role]> for AllowedRoles<'a> {
    fn from(roles: &'a [Role]) -> Self {
        AllowedRoles::Many(roles)
    }
}

impl<'a, const N: usize> From<&'a [Role; N]> for AllowedRoles<'a> {
    fn from(roles: &'a [Role; N]) -> Self {
        AllowedRoles::Many(roles)
    }
}

impl<'a> From<&'a Vec<Role>> for AllowedRoles<'a> {
    fn from(roles: &'a Vec<Role>) -> Self {
        AllowedRoles::Many(roles.as_slice())
    }
}

pub fn check_role<'a>(role: Option<Role>, allowed: impl Into<AllowedRoles<'a>>) -> bool {
    let Some(role) = role else {
        return false;
    };
    match allowed.into() {
        AllowedRoles::One(expected) => role == expected,
        AllowedRoles::Many(roles) => roles.contains(&role),
    }
}
