use serde_json::json;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::{SupabaseClient, SupabaseError};
use shared_models::auth::User;

use crate::models::{AuthAccount, AuthError, AuthSession, Credentials, Registration};

pub struct AuthService {
    supabase: SupabaseClient,
}

impl AuthService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Password grant. Every rejection by Supabase Auth collapses into `InvalidCredentials`.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthSession, AuthError> {
        debug!("Password login for {}", credentials.email);

        let session = match self
            .supabase
            .sign_in_with_password(&credentials.email, &credentials.password)
            .await
        {
            Ok(session) => session,
            Err(SupabaseError::Auth(_)) | Err(SupabaseError::NotFound(_)) => {
                warn!("Failed login attempt");
                return Err(AuthError::InvalidCredentials);
            }
            Err(SupabaseError::Api { status, .. }) if (400..500).contains(&status) => {
                warn!("Failed login attempt");
                return Err(AuthError::InvalidCredentials);
            }
            Err(err) => return Err(AuthError::Upstream(err)),
        };

        serde_json::from_value(session).map_err(|e| AuthError::Malformed(e.to_string()))
    }

    pub async fn register(&self, registration: &Registration) -> Result<User, AuthError> {
        debug!("Registering {} as {}", registration.email, registration.role);

        let created = self
            .supabase
            .sign_up(
                &registration.email,
                &registration.password,
                json!({
                    "name": registration.name,
                    "role": registration.role,
                }),
            )
            .await
            .map_err(|err| match err {
                SupabaseError::Api { status, ref message }
                    if matches!(status, 400 | 422) && is_duplicate_account(message) =>
                {
                    AuthError::EmailTaken
                }
                SupabaseError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Upstream(other),
            })?;

        // With email confirmation on, the account comes back bare instead of inside a session
        let account = match created.get("user") {
            Some(user) if user.is_object() => user.clone(),
            _ => created,
        };
        let account: AuthAccount =
            serde_json::from_value(account).map_err(|e| AuthError::Malformed(e.to_string()))?;

        // The role is granted into app_metadata by the insert trigger on auth.users,
        // which the sign-up response may not reflect yet
        let mut user = account.into_user();
        user.role.get_or_insert(registration.role);
        info!("Registered account {} as {}", user.id, registration.role);
        Ok(user)
    }

    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.supabase.sign_out(token).await?;
        debug!("Session revoked");
        Ok(())
    }
}

fn is_duplicate_account(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("already registered") || message.contains("already exists")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_account_messages() {
        assert!(is_duplicate_account(
            r#"{"code":422,"error_code":"user_already_exists","msg":"User already registered"}"#
        ));
        assert!(!is_duplicate_account(r#"{"msg":"Password should be at least 6 characters"}"#));
    }
}
