use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use shared_database::SupabaseError;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_models::validation::ValidationErrors;
use shared_utils::validation::{email, max_length, required};

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<Credentials, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let address = required(&mut errors, "email", self.email.as_deref());
        if let Some(address) = address {
            email(&mut errors, "email", address);
        }
        // Passwords are never trimmed
        let password = self.password.as_deref().filter(|p| !p.is_empty());
        if password.is_none() {
            errors.add("password", "The password field is required.");
        }

        match (address, password) {
            (Some(address), Some(password)) if errors.is_empty() => Ok(Credentials {
                email: address.to_string(),
                password: password.to_string(),
            }),
            _ => Err(errors),
        }
    }
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<Registration, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = required(&mut errors, "name", self.name.as_deref());
        if let Some(name) = name {
            max_length(&mut errors, "name", name, 255);
        }

        let address = required(&mut errors, "email", self.email.as_deref());
        if let Some(address) = address {
            email(&mut errors, "email", address);
        }

        let password = self.password.as_deref().filter(|p| !p.is_empty());
        match password {
            None => errors.add("password", "The password field is required."),
            Some(p) => {
                if p.chars().count() < MIN_PASSWORD_LENGTH {
                    errors.add(
                        "password",
                        format!(
                            "The password must be at least {} characters.",
                            MIN_PASSWORD_LENGTH
                        ),
                    );
                }
                if self.password_confirmation.as_deref() != Some(p) {
                    errors.add("password", "The password confirmation does not match.");
                }
            }
        }

        let role = required(&mut errors, "role", self.role.as_deref()).and_then(|raw| {
            match raw.parse::<Role>() {
                // Administrators are provisioned server-side only
                Ok(Role::Admin) => {
                    errors.add("role", "The admin role cannot be self-assigned.");
                    None
                }
                Ok(role) => Some(role),
                Err(_) => {
                    errors.add("role", "The selected role is invalid.");
                    None
                }
            }
        });

        match (name, address, password, role) {
            (Some(name), Some(address), Some(password), Some(role)) if errors.is_empty() => {
                Ok(Registration {
                    name: name.to_string(),
                    email: address.to_string(),
                    password: password.to_string(),
                    role,
                })
            }
            _ => Err(errors),
        }
    }
}

/// Account as returned by Supabase Auth.
#[derive(Debug, Deserialize)]
pub struct AuthAccount {
    pub id: String,
    pub email: Option<String>,
    #[serde(default)]
    pub app_metadata: Value,
    #[serde(default)]
    pub user_metadata: Value,
}

impl AuthAccount {
    /// The role is read from `app_metadata` only; the account can rewrite its own `user_metadata`.
    pub fn into_user(self) -> User {
        let role = self
            .app_metadata
            .get("role")
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse().ok());
        let name = self
            .user_metadata
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);

        User {
            id: self.id,
            email: self.email,
            name,
            role,
            created_at: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
    pub user: AuthAccount,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
    pub user: User,
}

/// Table holding the profile an account of a given role can be linked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Doctor,
    Nurse,
    Patient,
}

impl ProfileKind {
    /// Admin and staff accounts have no profile table.
    pub fn for_role(role: Role) -> Option<Self> {
        match role {
            Role::Doctor => Some(ProfileKind::Doctor),
            Role::Nurse => Some(ProfileKind::Nurse),
            Role::Patient => Some(ProfileKind::Patient),
            Role::Admin | Role::Staff => None,
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            ProfileKind::Doctor => "doctors",
            ProfileKind::Nurse => "nurses",
            ProfileKind::Patient => "patients",
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileKind::Doctor => f.write_str("doctor"),
            ProfileKind::Nurse => f.write_str("nurse"),
            ProfileKind::Patient => f.write_str("patient"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LinkedProfile {
    pub kind: ProfileKind,
    pub row: Value,
}

impl LinkedProfile {
    pub fn id(&self) -> Option<i64> {
        self.row.get("id").and_then(Value::as_i64)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("The email has already been taken.")]
    EmailTaken,

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Unexpected auth response: {0}")]
    Malformed(String),

    #[error(transparent)]
    Upstream(#[from] SupabaseError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::Auth("Invalid credentials".to_string()),
            AuthError::EmailTaken => AppError::Validation(ValidationErrors::single(
                "email",
                "The email has already been taken.",
            )),
            AuthError::Validation(errors) => AppError::Validation(errors),
            AuthError::Malformed(msg) => AppError::ExternalService(msg),
            AuthError::Upstream(err) => AppError::from(err),
        }
    }
}
