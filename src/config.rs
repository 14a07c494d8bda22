/*!
 * Application Configuration
 * Everything is read from environment variables (optionally via `.env`).
 */
use axum::http::{HeaderValue, Method};
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;

pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";

const DEFAULT_SITE_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub site_url: String,
    pub storage_dir: String,
    pub storage_public_url: String,
    pub storage_signing_secret: String,
    pub allowed_origins: Vec<String>,
}

fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(fallback)
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret = env_or("JWT_SECRET", DEFAULT_JWT_SECRET);
        let site_url = env_or("SITE_URL", DEFAULT_SITE_URL)
            .trim_end_matches('/')
            .to_string();

        // ALLOWED_ORIGINS (comma-separated) wins over FRONTEND_ORIGIN.
        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .or_else(|| std::env::var("FRONTEND_ORIGIN").ok().map(|o| vec![o]))
            .unwrap_or_default();

        Self {
            environment: env_or("ENVIRONMENT", "development"),
            host: env_or("HOST", "127.0.0.1"),
            port: env_parse("PORT", 3001),
            database_url: std::env::var("DATABASE_URL").ok().filter(|u| !u.is_empty()),
            session_ttl_hours: env_parse("SESSION_TTL_HOURS", 12),
            storage_dir: env_or("STORAGE_DIR", "storage"),
            storage_public_url: env_or("STORAGE_PUBLIC_URL", &site_url)
                .trim_end_matches('/')
                .to_string(),
            storage_signing_secret: env_or("STORAGE_SIGNING_SECRET", &jwt_secret),
            jwt_secret,
            site_url,
            allowed_origins,
        }
    }

    /// Configuration used by tests and local tooling; never reads the environment.
    pub fn for_tests() -> Self {
        Self {
            environment: "test".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: None,
            jwt_secret: "test-jwt-secret".to_string(),
            session_ttl_hours: 1,
            site_url: "https://portfolio.test".to_string(),
            storage_dir: std::env::temp_dir()
                .join(format!("portfolio-storage-{}", uuid::Uuid::new_v4()))
                .to_string_lossy()
                .into_owned(),
            storage_public_url: "https://portfolio.test".to_string(),
            storage_signing_secret: "test-signing-secret".to_string(),
            allowed_origins: vec![],
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    /// Refuse to boot in production with the shipped JWT secret.
    pub fn validate(&self) -> Result<(), String> {
        if self.is_production() && self.jwt_secret == DEFAULT_JWT_SECRET {
            return Err(
                "JWT_SECRET must be set to a secure, unique value in production".to_string(),
            );
        }
        Ok(())
    }

    /// Falls back to the local front-end dev servers when nothing is configured.
    pub fn cors_layer(&self) -> CorsLayer {
        let mut origins: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        if origins.is_empty() {
            origins = vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
            ];
        }

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
            ])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
            ])
            .allow_credentials(true)
    }
}
