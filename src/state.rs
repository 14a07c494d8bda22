//! Shared application state handed to every handler.

use sqlx::PgPool;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::rate_limit::FixedWindowLimiter;
use crate::repo::memory::{
    MemoryBlogPostRepo, MemoryCertificateRepo, MemoryMessageRepo, MemoryProjectRepo,
    MemorySettingsRepo, MemorySkillRepo, MemoryUserRepo,
};
use crate::repo::postgres::{
    PgBlogPostRepo, PgCertificateRepo, PgMessageRepo, PgProjectRepo, PgSettingsRepo, PgSkillRepo,
    PgUserRepo,
};
use crate::repo::{
    BlogPostRepo, CertificateRepo, MessageRepo, ProjectRepo, SettingsRepo, SkillRepo, UserRepo,
};
use crate::storage::{LocalObjectStore, ObjectStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub projects: Arc<dyn ProjectRepo>,
    pub posts: Arc<dyn BlogPostRepo>,
    pub certificates: Arc<dyn CertificateRepo>,
    pub skills: Arc<dyn SkillRepo>,
    pub messages: Arc<dyn MessageRepo>,
    pub settings: Arc<dyn SettingsRepo>,
    pub users: Arc<dyn UserRepo>,
    pub storage: Arc<dyn ObjectStore>,
    /// Contact form limiter: 5 submissions per minute per client.
    pub contact_limiter: Arc<FixedWindowLimiter>,
    /// Login and sign-up limiter.
    pub auth_limiter: Arc<FixedWindowLimiter>,
    /// Present only when running against Postgres; used by the health checks.
    pub pool: Option<PgPool>,
}

impl AppState {
    fn local_storage(config: &AppConfig) -> Arc<dyn ObjectStore> {
        Arc::new(LocalObjectStore::new(
            &config.storage_dir,
            &config.storage_public_url,
            &config.storage_signing_secret,
        ))
    }

    pub fn postgres(pool: PgPool, config: AppConfig) -> Self {
        Self {
            projects: Arc::new(PgProjectRepo::new(pool.clone())),
            posts: Arc::new(PgBlogPostRepo::new(pool.clone())),
            certificates: Arc::new(PgCertificateRepo::new(pool.clone())),
            skills: Arc::new(PgSkillRepo::new(pool.clone())),
            messages: Arc::new(PgMessageRepo::new(pool.clone())),
            settings: Arc::new(PgSettingsRepo::new(pool.clone())),
            users: Arc::new(PgUserRepo::new(pool.clone())),
            storage: Self::local_storage(&config),
            contact_limiter: Arc::new(FixedWindowLimiter::contact()),
            auth_limiter: Arc::new(FixedWindowLimiter::auth()),
            pool: Some(pool),
            config: Arc::new(config),
        }
    }

    pub fn in_memory(config: AppConfig) -> Self {
        Self::in_memory_with_users(config, Arc::new(MemoryUserRepo::new()))
    }

    /// In-memory state sharing a caller-owned user store, so tests can flip
    /// admin flags on accounts they created through the API.
    pub fn in_memory_with_users(config: AppConfig, users: Arc<MemoryUserRepo>) -> Self {
        Self {
            projects: Arc::new(MemoryProjectRepo::new()),
            posts: Arc::new(MemoryBlogPostRepo::new()),
            certificates: Arc::new(MemoryCertificateRepo::new()),
            skills: Arc::new(MemorySkillRepo::new()),
            messages: Arc::new(MemoryMessageRepo::new()),
            settings: Arc::new(MemorySettingsRepo::new()),
            users,
            storage: Self::local_storage(&config),
            contact_limiter: Arc::new(FixedWindowLimiter::contact()),
            auth_limiter: Arc::new(FixedWindowLimiter::auth()),
            pool: None,
            config: Arc::new(config),
        }
    }
}
