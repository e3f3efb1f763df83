use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::services::report_service::{self, Dashboard};

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Reference date for overdue detection, defaults to today
    pub as_of: Option<NaiveDate>,
}

#[utoipa::path(
    get,
    path = "/api/dashboard",
    params(("as_of" = Option<String>, Query, description = "YYYY-MM-DD, defaults to today")),
    responses(
        (status = 200, description = "Counts, genre distribution and overdue transactions")
    )
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Dashboard>, DomainError> {
    let as_of = query.as_of.unwrap_or_else(|| Local::now().date_naive());
    let dashboard = report_service::dashboard(state.db(), as_of).await?;
    Ok(Json(dashboard))
}
