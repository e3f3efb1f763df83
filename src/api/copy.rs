//! Copy API handlers using repository pattern

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Value, json};

use crate::domain::{CreateCopyInput, DomainError, UpdateCopyInput};
use crate::infrastructure::AppState;

// List all copies with book titles and circulation status
pub async fn list_copies(State(state): State<AppState>) -> Result<Json<Value>, DomainError> {
    let copies = state.copy_repo.find_all().await?;
    Ok(Json(json!({
        "total": copies.len(),
        "copies": copies,
    })))
}

// Register a new physical copy
pub async fn create_copy(
    State(state): State<AppState>,
    Json(payload): Json<CreateCopyInput>,
) -> Result<impl IntoResponse, DomainError> {
    let copy = state.copy_repo.create(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "copy": copy,
            "message": "Copy created successfully"
        })),
    ))
}

pub async fn get_copy(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, DomainError> {
    let copy = state
        .copy_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Copy {}", id)))?;
    Ok(Json(json!({ "copy": copy })))
}

// Get copies of a specific book
pub async fn get_book_copies(
    State(state): State<AppState>,
    Path(book_id): Path<i32>,
) -> Result<Json<Value>, DomainError> {
    state
        .book_repo
        .find_by_id(book_id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Book {}", book_id)))?;

    let copies = state.copy_repo.find_by_book_id(book_id).await?;
    Ok(Json(json!({
        "total": copies.len(),
        "copies": copies,
    })))
}

/// Partial update; setting `current_location` moves the copy
pub async fn update_copy(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCopyInput>,
) -> Result<Json<Value>, DomainError> {
    let copy = state.copy_repo.update(id, payload).await?;
    Ok(Json(json!({ "copy": copy })))
}

pub async fn delete_copy(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, DomainError> {
    state.copy_repo.delete(id).await?;
    Ok(Json(json!({ "message": "Copy deleted successfully" })))
}
