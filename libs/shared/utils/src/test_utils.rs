use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    /// Points the Supabase client at a wiremock server.
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", "patient")
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            name: "Test User".to_string(),
            role: role.to_string(),
        }
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor")
    }

    pub fn nurse(email: &str) -> Self {
        Self::new(email, "nurse")
    }

    pub fn staff(email: &str) -> Self {
        Self::new(email, "staff")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            name: Some(self.name.clone()),
            role: self.role.parse::<Role>().ok(),
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        Self::sign_claims(
            &json!({
                "sub": user.id,
                "email": user.email,
                "role": "authenticated",
                "app_metadata": { "role": user.role },
                "user_metadata": { "name": user.name },
                "aud": "authenticated",
                "iat": now.timestamp(),
                "exp": exp.timestamp()
            }),
            secret,
        )
    }

    /// Signs arbitrary claims, for tokens shaped unlike a normal session.
    pub fn sign_claims(claims: &Value, secret: &str) -> String {
        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(claims.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }

    /// `Authorization` header value for `user` signed with the default test secret.
    pub fn bearer_for(user: &TestUser) -> String {
        let token = Self::create_test_token(user, &TestConfig::default().jwt_secret, Some(24));
        format!("Bearer {}", token)
    }
}

/// Rows shaped the way PostgREST returns them.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn facility_response(id: i64, name: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "address": "12 rue de la Santé, Lyon",
            "phone": "0472000000",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn doctor_response(id: i64, first_name: &str, last_name: &str, specialty: &str) -> Value {
        json!({
            "id": id,
            "first_name": first_name,
            "last_name": last_name,
            "specialty": specialty,
            "facility_id": 1,
            "account_id": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn nurse_response(id: i64, first_name: &str, last_name: &str) -> Value {
        json!({
            "id": id,
            "first_name": first_name,
            "last_name": last_name,
            "facility_id": 1,
            "account_id": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn patient_response(id: i64, first_name: &str, last_name: &str) -> Value {
        json!({
            "id": id,
            "first_name": first_name,
            "last_name": last_name,
            "birth_date": "1985-06-15",
            "sex": "F",
            "address": "3 place Bellecour, Lyon",
            "phone": "0612345678",
            "email": "patient@example.com",
            "account_id": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn appointment_response(id: i64, doctor_id: i64, patient_id: i64, scheduled_at: &str) -> Value {
        json!({
            "id": id,
            "doctor_id": doctor_id,
            "patient_id": patient_id,
            "scheduled_at": scheduled_at,
            "reason": "Consultation",
            "status": "pending",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn medical_record_response(id: i64, patient_id: i64) -> Value {
        json!({
            "id": id,
            "patient_id": patient_id,
            "history": "Appendectomy 2010",
            "allergies": "Penicillin",
            "chronic_conditions": null,
            "treatments": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn prescription_response(id: i64, doctor_id: i64, patient_id: i64) -> Value {
        json!({
            "id": id,
            "doctor_id": doctor_id,
            "patient_id": patient_id,
            "medication": "Amoxicillin 500mg",
            "dosage": "1 capsule three times a day",
            "duration": "7 days",
            "prescribed_on": "2024-03-01",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn session_response(user: &TestUser) -> Value {
        json!({
            "access_token": JwtTestUtils::create_test_token(user, &TestConfig::default().jwt_secret, Some(1)),
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh-token",
            "user": {
                "id": user.id,
                "email": user.email,
                "app_metadata": { "role": user.role },
                "user_metadata": { "name": user.name, "role": user.role },
                "created_at": "2024-01-01T00:00:00Z"
            }
        })
    }

    pub fn error_response(message: &str, code: &str) -> Value {
        json!({
            "code": code,
            "message": message
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.supabase_anon_key, "test-anon-key");
        assert!(!app_config.supabase_jwt_secret.is_empty());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::staff("desk@example.com");
        let user_model = user.to_user();

        assert_eq!(user_model.email, Some(user.email.clone()));
        assert_eq!(user_model.role, Some(Role::Staff));
        assert_eq!(user_model.id, user.id);
    }

    #[test]
    fn test_jwt_token_creation() {
        let token = JwtTestUtils::create_test_token(&TestUser::default(), "test-secret", Some(1));
        assert_eq!(token.split('.').count(), 3);
    }
}
