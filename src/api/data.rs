//! CSV import/export handlers

use axum::{
    Json,
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;

use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::services::csv_service;

/// Merge-import a books CSV sent as multipart field `file`
pub async fn import_books(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, DomainError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| DomainError::Import(e.to_string()))?
    {
        if field.name() == Some("file") {
            let data = field
                .bytes()
                .await
                .map_err(|e| DomainError::Import(e.to_string()))?;
            let summary = csv_service::import_books(state.db(), &data).await?;

            return Ok((
                StatusCode::OK,
                Json(json!({
                    "created": summary.created,
                    "updated": summary.updated,
                    "skipped": summary.skipped,
                    "message": "Merge import complete"
                })),
            ));
        }
    }

    Err(DomainError::Import("No file uploaded".to_string()))
}

pub async fn export_books(State(state): State<AppState>) -> Result<impl IntoResponse, DomainError> {
    let body = csv_service::export_books(state.db()).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        header::HeaderValue::from_static("attachment; filename=\"books.csv\""),
    );

    Ok((StatusCode::OK, headers, body))
}
