use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::validation::ValidationErrors;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("External service error: {0}")]
    ExternalService(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

/// Turns `"<context>: <field>: <reason>"` deserialization text into a field error.
fn deserialization_errors(body_text: &str, fallback_field: &str) -> ValidationErrors {
    let detail = body_text
        .split_once(": ")
        .map_or(body_text, |(_, rest)| rest);

    match detail.split_once(": ") {
        Some((field, reason)) if !field.is_empty() && !field.contains(char::is_whitespace) => {
            ValidationErrors::single(field, reason)
        }
        _ => ValidationErrors::single(fallback_field, detail),
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                AppError::Validation(deserialization_errors(&err.body_text(), "body"))
            }
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(deserialization_errors(&rejection.body_text(), "query"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            AppError::Validation(errors) => {
                tracing::debug!("Validation failed: {}", errors);
                json!({
                    "error": "The given data was invalid.",
                    "errors": errors
                })
            }
            AppError::Conflict(msg) => {
                tracing::warn!("Error: {}: {}", status, msg);
                json!({
                    "error": msg,
                    "code": "scheduling_conflict"
                })
            }
            // Persistence details stay in the logs
            AppError::Internal(msg) | AppError::Database(msg) => {
                tracing::error!("Error: {}: {}", status, msg);
                json!({ "error": "Internal server error" })
            }
            AppError::Auth(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::ExternalService(msg) => {
                tracing::error!("Error: {}: {}", status, msg);
                json!({ "error": msg })
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_renders_field_map() {
        let errors = ValidationErrors::single("sex", "The sex must be M or F.");
        let (status, body) = body_json(AppError::Validation(errors)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["sex"][0], "The sex must be M or F.");
    }

    #[tokio::test]
    async fn conflict_is_distinguishable() {
        let (status, body) = body_json(AppError::Conflict("slot taken".to_string())).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "scheduling_conflict");
    }

    #[tokio::test]
    async fn database_errors_are_not_leaked() {
        let (status, body) =
            body_json(AppError::Database("relation \"patients\" does not exist".to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[test]
    fn deserialization_text_points_at_the_field() {
        let errors = deserialization_errors(
            "Failed to deserialize the JSON body into the target type: doctor_id: invalid type: string \"abc\", expected i64 at line 1 column 17",
            "body",
        );
        assert_eq!(
            errors.messages("doctor_id"),
            ["invalid type: string \"abc\", expected i64 at line 1 column 17"]
        );
    }

    #[test]
    fn deserialization_text_without_a_path_uses_the_fallback() {
        let errors = deserialization_errors(
            "Failed to deserialize query string: invalid digit found in string",
            "query",
        );
        assert_eq!(errors.messages("query"), ["invalid digit found in string"]);
    }
}
