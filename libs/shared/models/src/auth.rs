use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

/// Claims of a Supabase Auth access token.
///
/// `role` is the Postgres role (`authenticated`, `anon`). The clinic role of
/// the account lives in `app_metadata.role`, which only the server can write;
/// `user_metadata` is editable by the account itself and never grants a role.
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<Value>,
    pub user_metadata: Option<Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

impl JwtClaims {
    pub fn clinic_role(&self) -> Option<Role> {
        metadata_str(self.app_metadata.as_ref(), "role").and_then(|raw| raw.parse().ok())
    }

    pub fn display_name(&self) -> Option<String> {
        metadata_str(self.user_metadata.as_ref(), "name").map(str::to_string)
    }
}

fn metadata_str<'a>(metadata: Option<&'a Value>, key: &str) -> Option<&'a str> {
    metadata.and_then(|m| m.get(key)).and_then(Value::as_str)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[serde(alias = "medecin")]
    Doctor,
    #[serde(alias = "infirmier")]
    Nurse,
    #[serde(alias = "receptionist")]
    Staff,
    Patient,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Doctor,
        Role::Nurse,
        Role::Staff,
        Role::Patient,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
            Role::Staff => "staff",
            Role::Patient => "patient",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "doctor" | "medecin" => Ok(Role::Doctor),
            "nurse" | "infirmier" => Ok(Role::Nurse),
            "staff" | "receptionist" => Ok(Role::Staff),
            "patient" => Ok(Role::Patient),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.role == Some(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn claims(app: Option<Value>, user: Option<Value>, role: Option<&str>) -> JwtClaims {
        JwtClaims {
            sub: "user-1".to_string(),
            exp: None,
            email: None,
            role: role.map(str::to_string),
            app_metadata: app,
            user_metadata: user,
            aud: None,
            iat: None,
        }
    }

    #[test]
    fn role_parses_aliases() {
        assert_eq!("receptionist".parse::<Role>(), Ok(Role::Staff));
        assert_eq!("Medecin".parse::<Role>(), Ok(Role::Doctor));
        assert_eq!("infirmier".parse::<Role>(), Ok(Role::Nurse));
        assert_matches!("guest".parse::<Role>(), Err(UnknownRole(raw)) if raw == "guest");
    }

    #[test]
    fn app_metadata_wins_over_user_metadata() {
        let c = claims(
            Some(json!({ "role": "nurse" })),
            Some(json!({ "role": "admin" })),
            Some("authenticated"),
        );
        assert_eq!(c.clinic_role(), Some(Role::Nurse));
    }

    #[test]
    fn self_written_user_metadata_grants_no_role() {
        let c = claims(None, Some(json!({ "role": "admin" })), Some("authenticated"));
        assert_eq!(c.clinic_role(), None);
    }

    #[test]
    fn postgres_role_claim_is_not_a_clinic_role() {
        let c = claims(None, None, Some("authenticated"));
        assert_eq!(c.clinic_role(), None);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Role::Staff).unwrap(), json!("staff"));
        let parsed: Role = serde_json::from_value(json!("receptionist")).unwrap();
        assert_eq!(parsed, Role::Staff);
    }
}
