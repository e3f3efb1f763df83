use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::services::report_service::{self, SearchHit};

#[derive(Debug, Deserialize, Clone)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    pub total: usize,
}

#[utoipa::path(
    get,
    path = "/api/search",
    params(("q" = String, Query, description = "Substring of title or author")),
    responses(
        (status = 200, description = "Matching books with copy locations")
    )
)]
pub async fn search_books(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, DomainError> {
    let results = report_service::search(state.db(), params.q.as_deref().unwrap_or("")).await?;

    Ok(Json(SearchResponse {
        total: results.len(),
        results,
    }))
}
