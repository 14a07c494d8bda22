//! Session tokens and the request extractors that guard the admin API.
//!
//! A session is a signed JWT carried either in the HttpOnly `session` cookie
//! or an `Authorization: Bearer` header. Admin status is resolved on every
//! request so revoking the profile flag takes effect immediately.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::db::models::User;
use crate::error::{ApiError, RepoResult};
use crate::repo::UserRepo;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session";

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,   // User ID
    pub email: String, // User email
    pub exp: i64,      // Expiry timestamp
    pub iat: i64,      // Issued at timestamp
}

pub fn create_session_token(
    user: &User,
    secret: &str,
    ttl_hours: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        exp: (now + Duration::hours(ttl_hours)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_session_token(
    token: &str,
    secret: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// Bearer header first, then the session cookie.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// `profiles.is_admin` when it is set, the legacy `user_metadata.is_admin`
/// flag otherwise, and `false` when neither says anything.
pub async fn is_admin(users: &dyn UserRepo, user: &User) -> RepoResult<bool> {
    match users.profile_admin_flag(user.id).await? {
        Some(flag) => Ok(flag),
        None => Ok(user.legacy_admin_flag() == Some(true)),
    }
}

/// The signed-in account behind a request.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub is_admin: bool,
}

/// Resolve the session for a request, `None` when there is no valid token or
/// the account no longer exists.
pub async fn resolve_session(
    headers: &HeaderMap,
    state: &AppState,
) -> Result<Option<Session>, ApiError> {
    let Some(token) = extract_token(headers) else {
        return Ok(None);
    };
    let claims = match verify_session_token(&token, &state.config.jwt_secret) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!("Session token rejected: {}", e);
            return Ok(None);
        }
    };
    let Ok(user_id) = claims.sub.parse::<uuid::Uuid>() else {
        return Ok(None);
    };
    let Some(user) = state.users.find_by_id(user_id).await? else {
        return Ok(None);
    };
    let is_admin = is_admin(state.users.as_ref(), &user).await?;
    Ok(Some(Session { user, is_admin }))
}

/// Any signed-in user; 401 otherwise.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Session);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match resolve_session(&parts.headers, state).await? {
            Some(session) => Ok(CurrentUser(session)),
            None => Err(ApiError::Unauthorized("Authentication required".to_string())),
        }
    }
}

/// A signed-in admin; 401 without a session, 403 for everyone else.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(session) = CurrentUser::from_request_parts(parts, state).await?;
        if !session.is_admin {
            tracing::warn!(user = %session.user.email, "non-admin attempted admin access");
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }
        Ok(AdminUser(session.user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::memory::MemoryUserRepo;
    use axum::http::HeaderValue;

    async fn user(repo: &MemoryUserRepo) -> User {
        repo.create("someone@example.com", "hash").await.unwrap()
    }

    #[tokio::test]
    async fn test_admin_flag_prefers_profile() {
        let repo = MemoryUserRepo::new();
        let u = user(&repo).await;
        assert!(!is_admin(&repo, &u).await.unwrap());

        repo.set_metadata(u.id, serde_json::json!({ "is_admin": true })).await;
        let u = repo.find_by_id(u.id).await.unwrap().unwrap();
        assert!(is_admin(&repo, &u).await.unwrap());

        // A non-null profile flag wins over the legacy metadata.
        repo.set_profile_admin(u.id, Some(false)).await;
        assert!(!is_admin(&repo, &u).await.unwrap());

        repo.set_profile_admin(u.id, Some(true)).await;
        repo.set_metadata(u.id, serde_json::json!({})).await;
        let u = repo.find_by_id(u.id).await.unwrap().unwrap();
        assert!(is_admin(&repo, &u).await.unwrap());
    }

    #[tokio::test]
    async fn test_token_round_trip_and_tamper() {
        let repo = MemoryUserRepo::new();
        let u = user(&repo).await;
        let token = create_session_token(&u, "secret", 1).unwrap();

        let claims = verify_session_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, u.id.to_string());
        assert!(verify_session_token(&token, "other-secret").is_err());
        assert!(verify_session_token("garbage", "secret").is_err());
    }

    #[test]
    fn test_extract_token_prefers_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("session=from-cookie"));
        assert_eq!(extract_token(&headers).as_deref(), Some("from-cookie"));

        headers.insert(
            "authorization",
            HeaderValue::from_static("Bearer from-header"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("from-header"));

        assert_eq!(extract_token(&HeaderMap::new()), None);
    }
}
