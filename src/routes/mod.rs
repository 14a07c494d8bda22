/**
 * Routes Module
 * API route handlers
 */
pub mod auth;
pub mod blog;
pub mod certificates;
pub mod contact;
pub mod dashboard;
pub mod feeds;
pub mod health;
pub mod home;
pub mod messages;
pub mod projects;
pub mod settings;
pub mod skills;
pub mod upload;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::Language;
use crate::error::ApiError;

/// JSON body extractor whose rejection is the usual `{error}` body.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!("Rejected JSON body: {}", rejection.body_text());
                Err(ApiError::validation("Invalid input"))
            }
        }
    }
}

/// Body of plain acknowledgements.
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// `?lang=en|om`, English when absent or unrecognised.
#[derive(Debug, Default, Deserialize)]
pub struct LangQuery {
    #[serde(default)]
    pub lang: Option<String>,
}

impl LangQuery {
    pub fn language(&self) -> Language {
        match self.lang.as_deref() {
            Some("om") => Language::Om,
            _ => Language::En,
        }
    }
}

/// `?confirm=true` is required on every admin delete.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

impl DeleteQuery {
    pub fn require(&self) -> Result<(), ApiError> {
        if self.confirm {
            Ok(())
        } else {
            Err(ApiError::validation(
                "Deletion must be confirmed with ?confirm=true",
            ))
        }
    }
}

/// Admin save body: an existing `id` updates, no `id` inserts.
#[derive(Debug, Deserialize)]
pub struct SaveRequest<T> {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(flatten)]
    pub draft: T,
}

/// Trimmed value, `None` when blank.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trimmed, de-duplicated list without blanks, original order kept.
pub(crate) fn clean_list(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim().to_string();
        if !value.is_empty() && !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

pub(crate) fn require_text(value: &str, message: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(message));
    }
    Ok(())
}

pub(crate) fn require_url(value: &str, field: &str) -> Result<(), ApiError> {
    if !(value.starts_with("http://") || value.starts_with("https://") || value.starts_with('/')) {
        return Err(ApiError::validation(format!("{} must be a valid URL", field)));
    }
    Ok(())
}
