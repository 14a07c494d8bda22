/**
 * Contact Route
 * Public contact form submission
 */
use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use chrono::Utc;

use crate::db::models::NewContactMessage;
use crate::error::ApiError;
use crate::rate_limit::client_id;
use crate::routes::SuccessResponse;
use crate::state::AppState;
use crate::validation::{validate_contact, ContactPayload};

/// POST /api/contact
///
/// The rate limit is charged before the body is even parsed, so malformed
/// submissions count against the client too.
pub async fn submit_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SuccessResponse>, ApiError> {
    let now = Utc::now();
    let client = client_id(&headers);
    let decision = state.contact_limiter.check(&client, now);
    if !decision.allowed {
        tracing::warn!(client = %client, "contact form rate limited");
        return Err(ApiError::RateLimited {
            retry_after_secs: decision.retry_after_secs(now),
        });
    }

    let payload: ContactPayload = serde_json::from_slice(&body)
        .map_err(|_| ApiError::validation("Invalid input"))?;
    let contact = validate_contact(payload).map_err(ApiError::Validation)?;

    let stored = state
        .messages
        .insert(NewContactMessage::from(contact))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to store contact message");
            ApiError::Internal("Failed to save message".to_string())
        })?;

    tracing::info!(message_id = %stored.id, remaining = decision.remaining, "contact message received");
    Ok(Json(SuccessResponse::ok()))
}
