use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Value, json};

use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::models::MemberDto;

pub async fn list_members(State(state): State<AppState>) -> Result<Json<Value>, DomainError> {
    let members = state.member_repo.find_all().await?;
    Ok(Json(json!({
        "total": members.len(),
        "members": members,
    })))
}

pub async fn get_member(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, DomainError> {
    let member = state
        .member_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Member {}", id)))?;
    Ok(Json(json!({ "member": member })))
}

pub async fn create_member(
    State(state): State<AppState>,
    Json(member): Json<MemberDto>,
) -> Result<impl IntoResponse, DomainError> {
    let member = state.member_repo.create(member).await?;
    Ok((StatusCode::CREATED, Json(json!({ "member": member }))))
}

pub async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(member): Json<MemberDto>,
) -> Result<Json<Value>, DomainError> {
    let member = state.member_repo.update(id, member).await?;
    Ok(Json(json!({ "member": member })))
}

pub async fn delete_member(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, DomainError> {
    state.member_repo.delete(id).await?;
    Ok(Json(json!({ "message": "Member deleted successfully" })))
}
