//! Domain error types
//!
//! These errors are framework-agnostic and represent business-level failures.
//! Every variant is surfaced to the caller as a user-visible message.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),
    /// Missing or malformed required field
    #[error("Validation error: {0}")]
    Validation(String),
    /// Unique constraint violation (book title, accession number, location id)
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
    /// Dangling reference on insert
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),
    /// Delete blocked by dependent rows
    #[error("Referential integrity error: {0}")]
    ReferentialIntegrity(String),
    /// Issue attempted on a copy that already has an open transaction
    #[error("Already issued: {0}")]
    AlreadyIssued(String),
    /// Return attempted on a transaction or copy that is not out
    #[error("Not issued: {0}")]
    NotIssued(String),
    /// Malformed import file
    #[error("Import error: {0}")]
    Import(String),
    /// Database/persistence error
    #[error("Database error: {0}")]
    Database(String),
}

impl DomainError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::NotFound(_) => "not_found",
            DomainError::Validation(_) => "validation",
            DomainError::DuplicateKey(_) => "duplicate_key",
            DomainError::ForeignKeyViolation(_) => "foreign_key_violation",
            DomainError::ReferentialIntegrity(_) => "referential_integrity",
            DomainError::AlreadyIssued(_) => "already_issued",
            DomainError::NotIssued(_) => "not_issued",
            DomainError::Import(_) => "import",
            DomainError::Database(_) => "database",
        }
    }
}

// Conversion from SeaORM errors (used in infrastructure layer)
impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        match e.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(msg)) => DomainError::DuplicateKey(msg),
            Some(sea_orm::SqlErr::ForeignKeyConstraintViolation(msg)) => {
                DomainError::ForeignKeyViolation(msg)
            }
            _ => DomainError::Database(e.to_string()),
        }
    }
}

/// Trim a required text field, rejecting blanks.
pub fn required(field: &str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field; blank becomes `None`.
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("title", "  Dune ").unwrap(), "Dune");
        let err = required("title", "   ").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(err.to_string(), "Validation error: title is required");
    }

    #[test]
    fn optional_drops_blank() {
        assert_eq!(optional(Some("  ".into())), None);
        assert_eq!(optional(Some(" A1 ".into())), Some("A1".into()));
        assert_eq!(optional(None), None);
    }
}
