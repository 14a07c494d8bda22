/**
 * Upload and Storage Routes
 * Admin media uploads, object serving, resume and profile image endpoints
 */
use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::settings::{PROFILE_IMAGE_URL_KEY, RESUME_URL_KEY};
use crate::session::AdminUser;
use crate::state::AppState;
use crate::storage::{
    is_public_bucket, profile_image_key, StorageError, StoredObject, AVATARS_BUCKET,
    BLOG_COVERS_BUCKET, RESUMES_BUCKET, RESUME_KEY,
};

pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024; // 5MB
/// Multipart framing on top of the file itself.
pub const UPLOAD_BODY_LIMIT: usize = MAX_FILE_SIZE + 64 * 1024;

const RESUME_LINK_TTL_SECS: i64 = 3600;
const PUBLIC_CACHE_CONTROL: &str = "public, max-age=300";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub key: String,
    pub size: usize,
    pub mime_type: String,
}

#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    pub expires: i64,
    pub sig: String,
}

fn validate_image_magic_bytes(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < 4 {
        return None;
    }
    match bytes {
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        // GIF: 47 49 46 38
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        // WebP: 52 49 46 46 ... 57 45 42 50
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        _ => None,
    }
}

fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

fn get_extension_from_mime(mime: &str) -> &str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "application/pdf" => "pdf",
        _ => "bin",
    }
}

/// Bytes of the first multipart field, size-checked.
async fn read_single_file(multipart: &mut Multipart) -> Result<Bytes, ApiError> {
    let field = match multipart.next_field().await {
        Ok(Some(field)) => field,
        Ok(None) => return Err(ApiError::validation("No file provided")),
        Err(e) => {
            tracing::warn!("Multipart error: {}", e);
            return Err(ApiError::validation("Invalid multipart data"));
        }
    };

    let bytes = field.bytes().await.map_err(|e| {
        tracing::warn!("Failed to read upload bytes: {}", e);
        ApiError::validation("Failed to read file data")
    })?;

    if bytes.is_empty() {
        return Err(ApiError::validation("Empty file"));
    }
    if bytes.len() > MAX_FILE_SIZE {
        return Err(ApiError::validation("File too large. Maximum size is 5MB."));
    }
    Ok(bytes)
}

fn require_image(bytes: &[u8]) -> Result<&'static str, ApiError> {
    validate_image_magic_bytes(bytes).ok_or_else(|| {
        ApiError::validation("File content does not match an allowed image type.")
    })
}

/// POST /api/admin/uploads/avatar - Replace the profile photo
pub async fn upload_avatar(
    _admin: AdminUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let bytes = read_single_file(&mut multipart).await?;
    let mime_type = require_image(&bytes)?;
    let size = bytes.len();

    // The extension carries the content type the avatar is later served with.
    let key = profile_image_key(get_extension_from_mime(mime_type));
    state.storage.put(AVATARS_BUCKET, &key, bytes).await?;
    let url = state.storage.public_url(AVATARS_BUCKET, &key);
    state.settings.upsert(PROFILE_IMAGE_URL_KEY, &url).await?;

    tracing::info!(size, key = %key, "profile image uploaded");
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            url,
            key,
            size,
            mime_type: mime_type.to_string(),
        }),
    ))
}

/// POST /api/admin/uploads/resume - Replace the resume PDF
pub async fn upload_resume(
    _admin: AdminUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let bytes = read_single_file(&mut multipart).await?;
    if !is_pdf(&bytes) {
        return Err(ApiError::validation("Resume must be a PDF file."));
    }
    let size = bytes.len();

    state.storage.put(RESUMES_BUCKET, RESUME_KEY, bytes).await?;
    let stored_url = state.storage.public_url(RESUMES_BUCKET, RESUME_KEY);
    state.settings.upsert(RESUME_URL_KEY, &stored_url).await?;

    tracing::info!(size, "resume uploaded");
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            url: "/api/resume".to_string(),
            key: RESUME_KEY.to_string(),
            size,
            mime_type: "application/pdf".to_string(),
        }),
    ))
}

/// POST /api/admin/uploads/blog-cover - Store a new cover image
pub async fn upload_blog_cover(
    _admin: AdminUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let bytes = read_single_file(&mut multipart).await?;
    let mime_type = require_image(&bytes)?;
    let size = bytes.len();

    let key = format!("{}.{}", Uuid::new_v4(), get_extension_from_mime(mime_type));
    state.storage.put(BLOG_COVERS_BUCKET, &key, bytes).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            url: state.storage.public_url(BLOG_COVERS_BUCKET, &key),
            key,
            size,
            mime_type: mime_type.to_string(),
        }),
    ))
}

fn object_response(object: StoredObject) -> Response {
    (
        [
            (header::CONTENT_TYPE, object.content_type),
            (header::CACHE_CONTROL, PUBLIC_CACHE_CONTROL.to_string()),
        ],
        Body::from(object.bytes),
    )
        .into_response()
}

fn redirect_found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Invalid keys and unknown buckets look the same as missing objects.
async fn fetch_object(state: &AppState, bucket: &str, key: &str) -> Result<StoredObject, ApiError> {
    match state.storage.get(bucket, key).await {
        Ok(Some(object)) => Ok(object),
        Ok(None)
        | Err(StorageError::InvalidKey(_))
        | Err(StorageError::UnknownBucket(_)) => Err(ApiError::not_found("File")),
        Err(e) => Err(e.into()),
    }
}

/// GET /storage/{bucket}/{*key} - Public buckets only
pub async fn serve_public(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    if !is_public_bucket(&bucket) {
        return Err(ApiError::not_found("File"));
    }
    Ok(object_response(fetch_object(&state, &bucket, &key).await?))
}

/// GET /storage/signed/{bucket}/{*key}?expires=&sig=
pub async fn serve_signed(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
    Query(query): Query<SignedQuery>,
) -> Result<Response, ApiError> {
    if !state
        .storage
        .verify_signature(&bucket, &key, query.expires, &query.sig, Utc::now())
    {
        return Err(ApiError::Forbidden("Invalid or expired link".to_string()));
    }
    let object = fetch_object(&state, &bucket, &key).await?;
    Ok((
        [
            (header::CONTENT_TYPE, object.content_type),
            (header::CACHE_CONTROL, "private, no-store".to_string()),
        ],
        Body::from(object.bytes),
    )
        .into_response())
}

/// GET /api/resume - 302 to a short-lived signed link
pub async fn resume(State(state): State<AppState>) -> Result<Response, ApiError> {
    if !state.storage.exists(RESUMES_BUCKET, RESUME_KEY).await? {
        return Err(ApiError::NotFound("Resume".to_string()));
    }
    let url = state.storage.signed_url(
        RESUMES_BUCKET,
        RESUME_KEY,
        Duration::seconds(RESUME_LINK_TTL_SECS),
        Utc::now(),
    )?;
    Ok(redirect_found(&url))
}

/// GET /api/profile-image - Stored avatar bytes, or a redirect to the configured URL
pub async fn profile_image(State(state): State<AppState>) -> Result<Response, ApiError> {
    let url = state
        .settings
        .get(PROFILE_IMAGE_URL_KEY)
        .await?
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let Some(url) = url else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let Some(key) = state.storage.key_from_public_url(AVATARS_BUCKET, &url) else {
        return Ok(redirect_found(&url));
    };
    match state.storage.get(AVATARS_BUCKET, &key).await? {
        Some(object) => Ok(object_response(object)),
        None => Ok(redirect_found(&url)),
    }
}
