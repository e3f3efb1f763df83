//! Mapping of domain errors onto HTTP responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::domain::DomainError;

impl DomainError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Validation(_) | DomainError::Import(_) => StatusCode::BAD_REQUEST,
            DomainError::DuplicateKey(_)
            | DomainError::ReferentialIntegrity(_)
            | DomainError::AlreadyIssued(_)
            | DomainError::NotIssued(_) => StatusCode::CONFLICT,
            DomainError::ForeignKeyViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DomainError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (
            status,
            Json(json!({ "error": self.to_string(), "kind": self.kind() })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_errors_are_conflicts() {
        assert_eq!(
            DomainError::AlreadyIssued("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            DomainError::NotIssued("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            DomainError::ForeignKeyViolation("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            DomainError::NotFound("Book 1".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }
}
