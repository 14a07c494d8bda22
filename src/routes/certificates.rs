/**
 * Certificate Routes
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::db::models::{Certificate, CertificateDraft};
use crate::error::ApiError;
use crate::routes::{
    non_blank, require_text, require_url, ApiJson, DeleteQuery, SaveRequest, SuccessResponse,
};
use crate::session::AdminUser;
use crate::state::AppState;

fn prepare_draft(mut draft: CertificateDraft) -> Result<CertificateDraft, ApiError> {
    require_text(&draft.title_en, "Title is required")?;
    require_text(&draft.credential_url, "Credential URL is required")?;

    draft.title_en = draft.title_en.trim().to_string();
    draft.credential_url = draft.credential_url.trim().to_string();
    require_url(&draft.credential_url, "Credential URL")?;

    draft.title_om = non_blank(draft.title_om);
    draft.issuer = non_blank(draft.issuer);
    draft.image_url = non_blank(draft.image_url);
    Ok(draft)
}

/// GET /api/certificates
pub async fn list_certificates(
    State(state): State<AppState>,
) -> Result<Json<Vec<Certificate>>, ApiError> {
    Ok(Json(state.certificates.list(None).await?))
}

/// GET /api/admin/certificates
pub async fn admin_list_certificates(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Certificate>>, ApiError> {
    Ok(Json(state.certificates.list(None).await?))
}

/// POST /api/admin/certificates - Create or update
pub async fn save_certificate(
    _admin: AdminUser,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SaveRequest<CertificateDraft>>,
) -> Result<(StatusCode, Json<Certificate>), ApiError> {
    let draft = prepare_draft(request.draft)?;
    match request.id {
        Some(id) => {
            let certificate = state
                .certificates
                .update(id, draft)
                .await?
                .ok_or_else(|| ApiError::not_found("Certificate"))?;
            Ok((StatusCode::OK, Json(certificate)))
        }
        None => {
            let certificate = state.certificates.insert(draft).await?;
            tracing::info!(certificate_id = %certificate.id, "certificate created");
            Ok((StatusCode::CREATED, Json(certificate)))
        }
    }
}

/// DELETE /api/admin/certificates/{id}?confirm=true
pub async fn delete_certificate(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(confirm): Query<DeleteQuery>,
) -> Result<Json<SuccessResponse>, ApiError> {
    confirm.require()?;
    if !state.certificates.delete(id).await? {
        return Err(ApiError::not_found("Certificate"));
    }
    tracing::info!(certificate_id = %id, "certificate deleted");
    Ok(Json(SuccessResponse::ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_draft_requires_credential_url() {
        let draft = CertificateDraft {
            title_en: "AWS Cloud Practitioner".to_string(),
            ..Default::default()
        };
        assert_eq!(
            prepare_draft(draft).unwrap_err().to_string(),
            "Credential URL is required"
        );
    }

    #[test]
    fn test_issued_at_parses_from_date_string() {
        let draft: CertificateDraft = serde_json::from_str(
            r#"{"titleEn":"CKA","credentialUrl":"https://cert.example/1","issuedAt":"2024-03-01"}"#,
        )
        .unwrap();
        let draft = prepare_draft(draft).unwrap();
        assert_eq!(draft.issued_at.unwrap().to_string(), "2024-03-01");
    }
}
