/**
 * Contact Message Routes (admin)
 */
use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::db::models::ContactMessage;
use crate::error::ApiError;
use crate::routes::{DeleteQuery, SuccessResponse};
use crate::session::AdminUser;
use crate::state::AppState;

/// GET /api/admin/messages - Newest first
pub async fn list_messages(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ContactMessage>>, ApiError> {
    Ok(Json(state.messages.list().await?))
}

/// PATCH /api/admin/messages/{id}/read
pub async fn mark_read(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, ApiError> {
    if !state.messages.mark_read(id).await? {
        return Err(ApiError::not_found("Message"));
    }
    Ok(Json(SuccessResponse::ok()))
}

/// DELETE /api/admin/messages/{id}?confirm=true
pub async fn delete_message(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(confirm): Query<DeleteQuery>,
) -> Result<Json<SuccessResponse>, ApiError> {
    confirm.require()?;
    if !state.messages.delete(id).await? {
        return Err(ApiError::not_found("Message"));
    }
    tracing::info!(message_id = %id, "contact message deleted");
    Ok(Json(SuccessResponse::ok()))
}
