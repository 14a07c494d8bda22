#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use portfolio_site::config::AppConfig;
use portfolio_site::create_app;
use portfolio_site::repo::memory::MemoryUserRepo;
use portfolio_site::state::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "Sup3rSecret";

pub struct TestSite {
    pub state: AppState,
    pub users: Arc<MemoryUserRepo>,
}

impl TestSite {
    pub fn new() -> Self {
        let users = Arc::new(MemoryUserRepo::new());
        let state = AppState::in_memory_with_users(AppConfig::for_tests(), users.clone());
        Self { state, users }
    }

    pub fn app(&self) -> Router {
        create_app(self.state.clone())
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let res = self.app().oneshot(req).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, bytes.to_vec())
    }

    pub async fn json(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let (status, _, bytes) = self.send(req).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Registers an account and returns its id and a session token.
    pub async fn sign_in(&self, email: &str) -> (Uuid, String) {
        let (status, body) = self
            .json(
                "POST",
                "/api/auth/sign-up",
                None,
                Some(serde_json::json!({
                    "email": email,
                    "password": PASSWORD,
                    "repeatPassword": PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "sign-up failed: {}", body);
        let id: Uuid = body["user"]["id"].as_str().unwrap().parse().unwrap();

        let (status, body) = self
            .json(
                "POST",
                "/api/auth/login",
                None,
                Some(serde_json::json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        (id, body["token"].as_str().unwrap().to_string())
    }

    pub async fn admin_token(&self) -> String {
        let (id, token) = self.sign_in("owner@example.com").await;
        self.users.set_profile_admin(id, Some(true)).await;
        token
    }
}
