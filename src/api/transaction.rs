//! Issue/return handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::services::circulation_service::{self, TransactionFilter};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    pub open: Option<bool>,
    pub member_id: Option<i32>,
    pub copy_id: Option<i32>,
    /// Reference date for the `overdue` flag, defaults to today
    pub as_of: Option<NaiveDate>,
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<Value>, DomainError> {
    let filter = TransactionFilter {
        open: query.open,
        member_id: query.member_id,
        copy_id: query.copy_id,
    };
    let transactions =
        circulation_service::list_transactions(state.db(), filter, query.as_of.unwrap_or_else(today))
            .await?;

    Ok(Json(json!({
        "total": transactions.len(),
        "transactions": transactions,
    })))
}

/// Identify the copy either by id or by accession number
#[derive(Debug, Deserialize)]
pub struct IssueRequest {
    pub copy_id: Option<i32>,
    pub accession_no: Option<String>,
    pub member_id: i32,
    /// Defaults to today
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

#[utoipa::path(
    post,
    path = "/api/transactions/issue",
    responses(
        (status = 201, description = "Copy issued"),
        (status = 409, description = "Copy already issued"),
        (status = 422, description = "Unknown copy or member")
    )
)]
pub async fn issue_copy(
    State(state): State<AppState>,
    Json(payload): Json<IssueRequest>,
) -> Result<impl IntoResponse, DomainError> {
    let issue_date = payload.issue_date.unwrap_or_else(today);

    let transaction = match (payload.copy_id, payload.accession_no) {
        (Some(copy_id), _) => {
            circulation_service::issue(
                state.db(),
                copy_id,
                payload.member_id,
                issue_date,
                payload.due_date,
            )
            .await?
        }
        (None, Some(accession_no)) => {
            circulation_service::issue_by_accession(
                state.db(),
                &accession_no,
                payload.member_id,
                issue_date,
                payload.due_date,
            )
            .await?
        }
        (None, None) => {
            return Err(DomainError::Validation(
                "copy_id or accession_no is required".to_string(),
            ));
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "transaction": transaction,
            "message": "Copy issued successfully"
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ReturnRequest {
    /// Defaults to today
    #[serde(default)]
    pub return_date: Option<NaiveDate>,
}

#[utoipa::path(
    put,
    path = "/api/transactions/{id}/return",
    params(("id" = i32, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Copy returned"),
        (status = 404, description = "Transaction not found"),
        (status = 409, description = "Transaction already closed")
    )
)]
pub async fn return_transaction(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    // The body is optional; without one the copy comes back today
    payload: Option<Json<ReturnRequest>>,
) -> Result<Json<Value>, DomainError> {
    let return_date = payload
        .and_then(|Json(p)| p.return_date)
        .unwrap_or_else(today);
    let transaction =
        circulation_service::return_transaction(state.db(), id, return_date).await?;

    Ok(Json(json!({
        "transaction": transaction,
        "message": "Copy returned successfully"
    })))
}

#[derive(Debug, Deserialize)]
pub struct ReturnCopyRequest {
    pub accession_no: String,
    #[serde(default)]
    pub return_date: Option<NaiveDate>,
}

pub async fn return_copy(
    State(state): State<AppState>,
    Json(payload): Json<ReturnCopyRequest>,
) -> Result<Json<Value>, DomainError> {
    let transaction = circulation_service::return_copy(
        state.db(),
        &payload.accession_no,
        payload.return_date.unwrap_or_else(today),
    )
    .await?;

    Ok(Json(json!({
        "transaction": transaction,
        "message": "Copy returned successfully"
    })))
}
