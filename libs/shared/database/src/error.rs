use reqwest::header::InvalidHeaderValue;
use thiserror::Error;

use shared_models::error::AppError;

#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// PostgREST answers 409 on unique and foreign key violations.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid header value: {0}")]
    Header(#[from] InvalidHeaderValue),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SupabaseError {
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => SupabaseError::Auth(message),
            404 => SupabaseError::NotFound(message),
            409 => SupabaseError::Conflict(message),
            _ => SupabaseError::Api { status, message },
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, SupabaseError::Conflict(_))
    }
}

impl From<SupabaseError> for AppError {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::Auth(msg) => AppError::Auth(msg),
            SupabaseError::NotFound(msg) => AppError::NotFound(msg),
            SupabaseError::Conflict(msg) => AppError::Conflict(msg),
            other => AppError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn statuses_map_to_variants() {
        assert_matches!(SupabaseError::from_status(401, String::new()), SupabaseError::Auth(_));
        assert_matches!(SupabaseError::from_status(404, String::new()), SupabaseError::NotFound(_));
        assert_matches!(SupabaseError::from_status(409, String::new()), SupabaseError::Conflict(_));
        assert_matches!(
            SupabaseError::from_status(500, String::new()),
            SupabaseError::Api { status: 500, .. }
        );
    }

    #[test]
    fn api_errors_become_database_errors() {
        let err = SupabaseError::Api { status: 500, message: "boom".to_string() };
        assert_matches!(AppError::from(err), AppError::Database(_));
    }
}
