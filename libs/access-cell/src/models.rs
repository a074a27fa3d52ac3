use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::auth::Role;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown permission: {0}")]
pub struct UnknownPermission(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageUsers,
    ManagePatients,
    ViewPatients,
    ManageAppointments,
    ViewAppointments,
    ManageMedicalRecords,
    ViewMedicalRecords,
    UpdateMedicalRecords,
    ViewStatistics,
}

impl Permission {
    pub const ALL: [Permission; 9] = [
        Permission::ManageUsers,
        Permission::ManagePatients,
        Permission::ViewPatients,
        Permission::ManageAppointments,
        Permission::ViewAppointments,
        Permission::ManageMedicalRecords,
        Permission::ViewMedicalRecords,
        Permission::UpdateMedicalRecords,
        Permission::ViewStatistics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ManageUsers => "manage_users",
            Permission::ManagePatients => "manage_patients",
            Permission::ViewPatients => "view_patients",
            Permission::ManageAppointments => "manage_appointments",
            Permission::ViewAppointments => "view_appointments",
            Permission::ManageMedicalRecords => "manage_medical_records",
            Permission::ViewMedicalRecords => "view_medical_records",
            Permission::UpdateMedicalRecords => "update_medical_records",
            Permission::ViewStatistics => "view_statistics",
        }
    }

    /// Stronger permissions that also satisfy this one when gating a request.
    pub fn implied_by(&self) -> &'static [Permission] {
        match self {
            Permission::ViewPatients => &[Permission::ManagePatients],
            Permission::ViewAppointments => &[Permission::ManageAppointments],
            Permission::ViewMedicalRecords => &[
                Permission::ManageMedicalRecords,
                Permission::UpdateMedicalRecords,
            ],
            Permission::UpdateMedicalRecords => &[Permission::ManageMedicalRecords],
            _ => &[],
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NavigationEntry {
    pub name: &'static str,
    pub path: &'static str,
    pub icon: &'static str,
    #[serde(skip)]
    pub roles: &'static [Role],
}

impl NavigationEntry {
    pub fn visible_to(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NavigationSection {
    pub title: &'static str,
    pub items: Vec<&'static NavigationEntry>,
}

#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
    pub role: Option<Role>,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Serialize)]
pub struct NavigationResponse {
    pub role: Option<Role>,
    pub sections: Vec<NavigationSection>,
}

#[derive(Debug, Deserialize)]
pub struct PermissionCheckQuery {
    pub permission: String,
}

#[derive(Debug, Deserialize)]
pub struct RoleCheckQuery {
    /// Comma separated role tags.
    pub allowed: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_strings_round_trip() {
        for permission in Permission::ALL {
            assert_eq!(permission.as_str().parse::<Permission>(), Ok(permission));
        }
        assert!("delete_everything".parse::<Permission>().is_err());
    }
}
