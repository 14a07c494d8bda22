/**
 * Authentication Routes
 * Email/password accounts with a JWT session cookie
 */
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::rate_limit::client_id;
use crate::routes::ApiJson;
use crate::session::{
    create_session_token, is_admin, removal_cookie, resolve_session, session_cookie,
};
use crate::state::AppState;
use crate::validation::{validate_sign_up, SignUpPayload};

// ============================================================================
// Request/Response Types
// ============================================================================

/// User info returned to frontend
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub is_admin: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserInfo,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignUpResponse {
    pub success: bool,
    pub user: UserInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user: Option<UserInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub success: bool,
}

// ============================================================================
// Helpers
// ============================================================================

fn check_auth_limit(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let now = Utc::now();
    let decision = state.auth_limiter.check(&client_id(headers), now);
    if !decision.allowed {
        return Err(ApiError::RateLimited {
            retry_after_secs: decision.retry_after_secs(now),
        });
    }
    Ok(())
}

/// bcrypt is CPU-bound; keep it off the async executor.
async fn hash_password(password: String) -> Result<String, ApiError> {
    match tokio::task::spawn_blocking(move || hash(&password, DEFAULT_COST)).await {
        Ok(Ok(h)) => Ok(h),
        Ok(Err(e)) => {
            tracing::error!("Failed to hash password: {}", e);
            Err(ApiError::Internal("Failed to process password".to_string()))
        }
        Err(e) => {
            tracing::error!("spawn_blocking panic during hash: {}", e);
            Err(ApiError::Internal("Failed to process password".to_string()))
        }
    }
}

async fn verify_password(password: String, password_hash: String) -> bool {
    tokio::task::spawn_blocking(move || verify(&password, &password_hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid credentials".to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/sign-up - Create a regular (non-admin) account
pub async fn sign_up(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<SignUpPayload>,
) -> Result<(StatusCode, Json<SignUpResponse>), ApiError> {
    check_auth_limit(&state, &headers)?;
    validate_sign_up(&payload).map_err(ApiError::Validation)?;

    let email = payload.email.trim().to_lowercase();
    let password_hash = hash_password(payload.password).await?;
    let user = state.users.create(&email, &password_hash).await?;

    tracing::info!(user_id = %user.id, "account registered");
    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            success: true,
            user: UserInfo {
                id: user.id,
                email: user.email,
                is_admin: false,
            },
        }),
    ))
}

/// POST /api/auth/login - Verify credentials and start a session
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    check_auth_limit(&state, &headers)?;

    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    let Some(user) = state.users.find_by_email(payload.email.trim()).await? else {
        tracing::warn!("Login attempt for unknown user");
        return Err(invalid_credentials());
    };

    if !verify_password(payload.password, user.password_hash.clone()).await {
        tracing::warn!(user_id = %user.id, "Failed login attempt");
        return Err(invalid_credentials());
    }

    let token = create_session_token(
        &user,
        &state.config.jwt_secret,
        state.config.session_ttl_hours,
    )
    .map_err(|e| {
        tracing::error!("Failed to create session token: {}", e);
        ApiError::Internal("Failed to create session".to_string())
    })?;
    let admin = is_admin(state.users.as_ref(), &user).await?;

    tracing::info!(user_id = %user.id, admin, "login succeeded");
    let jar = jar.add(session_cookie(token.clone(), state.config.is_production()));
    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            user: UserInfo {
                id: user.id,
                email: user.email,
                is_admin: admin,
            },
            token,
        }),
    ))
}

/// POST /api/auth/logout - Drop the session cookie
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<LogoutResponse>) {
    (
        jar.remove(removal_cookie()),
        Json(LogoutResponse { success: true }),
    )
}

/// GET /api/auth/session - The signed-in user, or null
pub async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionResponse>, ApiError> {
    let user = resolve_session(&headers, &state)
        .await?
        .map(|s| UserInfo {
            id: s.user.id,
            email: s.user.email,
            is_admin: s.is_admin,
        });
    Ok(Json(SessionResponse { user }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::{
        body::Body,
        http::Request,
        routing::{get, post},
        Router,
    };
    use tower::ServiceExt;

    fn auth_router(state: AppState) -> Router {
        Router::new()
            .route("/api/auth/sign-up", post(sign_up))
            .route("/api/auth/login", post(login))
            .route("/api/auth/logout", post(logout))
            .route("/api/auth/session", get(session))
            .with_state(state)
    }

    async fn post_json(
        app: Router,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, HeaderMap, serde_json::Value) {
        let req = Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, headers, serde_json::from_slice(&bytes).unwrap())
    }

    fn sign_up_body(email: &str) -> serde_json::Value {
        serde_json::json!({
            "email": email,
            "password": "Passw0rd",
            "repeatPassword": "Passw0rd"
        })
    }

    #[tokio::test]
    async fn test_sign_up_then_login_sets_cookie() {
        let state = AppState::in_memory(AppConfig::for_tests());
        let (status, _, body) = post_json(
            auth_router(state.clone()),
            "/api/auth/sign-up",
            sign_up_body("Reader@Example.com"),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["isAdmin"], false);
        assert_eq!(body["user"]["email"], "reader@example.com");

        let (status, headers, body) = post_json(
            auth_router(state),
            "/api/auth/login",
            serde_json::json!({ "email": "reader@example.com", "password": "Passw0rd" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
        let cookie = headers.get("set-cookie").unwrap().to_str().unwrap();
        assert!(cookie.starts_with("session="));
        assert!(cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_conflicts() {
        let state = AppState::in_memory(AppConfig::for_tests());
        post_json(
            auth_router(state.clone()),
            "/api/auth/sign-up",
            sign_up_body("dup@example.com"),
        )
        .await;
        let (status, _, body) = post_json(
            auth_router(state),
            "/api/auth/sign-up",
            sign_up_body("dup@example.com"),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Email already registered");
    }

    #[tokio::test]
    async fn test_sign_up_validation_message() {
        let state = AppState::in_memory(AppConfig::for_tests());
        let (status, _, body) = post_json(
            auth_router(state),
            "/api/auth/sign-up",
            serde_json::json!({ "email": "a@b.co", "password": "short", "repeatPassword": "short" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Password must be at least 8 characters");
    }

    #[tokio::test]
    async fn test_malformed_login_body_gets_json_error() {
        let state = AppState::in_memory(AppConfig::for_tests());
        let req = Request::post("/api/auth/login")
            .header("content-type", "application/json")
            .body(Body::from("{\"email\": "))
            .unwrap();
        let res = auth_router(state).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "Invalid input" }));
    }

    #[tokio::test]
    async fn test_login_wrong_credentials_returns_unauthorized() {
        let state = AppState::in_memory(AppConfig::for_tests());
        let (status, _, body) = post_json(
            auth_router(state),
            "/api/auth/login",
            serde_json::json!({ "email": "nobody@example.com", "password": "wrong" }),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid credentials");
    }

    #[tokio::test]
    async fn test_login_empty_email_returns_bad_request() {
        let state = AppState::in_memory(AppConfig::for_tests());
        let (status, _, _) = post_json(
            auth_router(state),
            "/api/auth/login",
            serde_json::json!({ "email": "", "password": "x" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_session_without_token_is_null() {
        let state = AppState::in_memory(AppConfig::for_tests());
        let req = Request::get("/api/auth/session").body(Body::empty()).unwrap();
        let res = auth_router(state).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: SessionResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(body.user.is_none());
    }

    #[tokio::test]
    async fn test_logout_returns_success() {
        let state = AppState::in_memory(AppConfig::for_tests());
        let (status, _, body) =
            post_json(auth_router(state), "/api/auth/logout", serde_json::json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }
}
