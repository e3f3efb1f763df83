//! Book catalog handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::domain::{BookFilter, DomainError};
use crate::infrastructure::AppState;
use crate::models::Book;

#[derive(Debug, Deserialize)]
pub struct ListBooksQuery {
    pub genre: Option<String>,
    pub location: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/books",
    responses(
        (status = 200, description = "Books ordered by title")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<ListBooksQuery>,
) -> Result<Json<Value>, DomainError> {
    let books = state
        .book_repo
        .find_all(BookFilter {
            genre: query.genre,
            default_location: query.location,
        })
        .await?;

    Ok(Json(json!({
        "total": books.len(),
        "books": books,
    })))
}

#[utoipa::path(
    get,
    path = "/api/books/{id}",
    params(("id" = i32, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book found"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, DomainError> {
    let book = state
        .book_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Book {}", id)))?;

    Ok(Json(json!({ "book": book })))
}

#[utoipa::path(
    post,
    path = "/api/books",
    responses(
        (status = 201, description = "Book created"),
        (status = 400, description = "Missing title"),
        (status = 409, description = "Title already in catalog")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    Json(book): Json<Book>,
) -> Result<impl IntoResponse, DomainError> {
    let book = state.book_repo.create(book).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Book created successfully",
            "book": book
        })),
    ))
}

#[utoipa::path(
    put,
    path = "/api/books/{id}",
    params(("id" = i32, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book updated"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Title already in catalog")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(book): Json<Book>,
) -> Result<Json<Value>, DomainError> {
    let book = state.book_repo.update(id, book).await?;
    Ok(Json(json!({ "book": book })))
}

#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    params(("id" = i32, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book deleted"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Copies still reference the book")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, DomainError> {
    state.book_repo.delete(id).await?;
    Ok(Json(json!({ "message": "Book deleted successfully" })))
}
