use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::services::report_service::{self, LocationContents};

#[derive(Debug, Deserialize)]
pub struct CreateLocationRequest {
    pub location_id: String,
    pub description: Option<String>,
}

pub async fn list_locations(State(state): State<AppState>) -> Result<Json<Value>, DomainError> {
    let locations = state.location_repo.find_all().await?;
    Ok(Json(json!({
        "total": locations.len(),
        "locations": locations,
    })))
}

pub async fn create_location(
    State(state): State<AppState>,
    Json(payload): Json<CreateLocationRequest>,
) -> Result<impl IntoResponse, DomainError> {
    let location = state
        .location_repo
        .create(payload.location_id, payload.description)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "location": location }))))
}

/// Books assigned to and copies currently at a location
pub async fn location_contents(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
) -> Result<Json<LocationContents>, DomainError> {
    let contents = report_service::location_contents(state.db(), &location_id).await?;
    Ok(Json(contents))
}
