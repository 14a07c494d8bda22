//! # Repositories
//!
//! One narrow persistence contract per record collection. The Postgres
//! implementation is used when `DATABASE_URL` is configured, the in-memory one
//! otherwise (and in tests).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::db::models::{
    BlogPost, BlogPostDraft, Certificate, CertificateDraft, ContactMessage, NewContactMessage,
    Project, ProjectDraft, Skill, SkillDraft, User,
};
use crate::error::RepoResult;

/// Projects, ordered by `display_order` ascending.
#[async_trait]
pub trait ProjectRepo: Send + Sync {
    async fn list(&self) -> RepoResult<Vec<Project>>;
    async fn list_featured(&self, limit: i64) -> RepoResult<Vec<Project>>;
    async fn get(&self, id: Uuid) -> RepoResult<Option<Project>>;
    async fn insert(&self, draft: ProjectDraft) -> RepoResult<Project>;
    async fn update(&self, id: Uuid, draft: ProjectDraft) -> RepoResult<Option<Project>>;
    async fn delete(&self, id: Uuid) -> RepoResult<bool>;
    async fn count(&self) -> RepoResult<i64>;
}

/// Blog posts. Admin listings are newest-created first, public listings
/// newest-published first.
#[async_trait]
pub trait BlogPostRepo: Send + Sync {
    async fn list_all(&self) -> RepoResult<Vec<BlogPost>>;
    /// Published posts, optionally restricted to those whose tags contain `tag`.
    async fn list_published(&self, tag: Option<&str>, limit: Option<i64>)
        -> RepoResult<Vec<BlogPost>>;
    /// Distinct tags across published posts, sorted.
    async fn published_tags(&self) -> RepoResult<Vec<String>>;
    async fn get(&self, id: Uuid) -> RepoResult<Option<BlogPost>>;
    async fn get_published_by_slug(&self, slug: &str) -> RepoResult<Option<BlogPost>>;
    /// Published posts other than `exclude` that share at least one tag.
    async fn related(&self, exclude: Uuid, tags: &[String], limit: i64)
        -> RepoResult<Vec<BlogPost>>;
    /// Fails with `RepoError::Conflict` when the slug is taken.
    async fn insert(&self, draft: BlogPostDraft) -> RepoResult<BlogPost>;
    async fn update(&self, id: Uuid, draft: BlogPostDraft) -> RepoResult<Option<BlogPost>>;
    async fn set_published(
        &self,
        id: Uuid,
        published: bool,
        published_at: Option<DateTime<Utc>>,
    ) -> RepoResult<Option<BlogPost>>;
    async fn delete(&self, id: Uuid) -> RepoResult<bool>;
    async fn count(&self) -> RepoResult<i64>;
}

/// Certificates, ordered by `display_order` ascending.
#[async_trait]
pub trait CertificateRepo: Send + Sync {
    async fn list(&self, limit: Option<i64>) -> RepoResult<Vec<Certificate>>;
    async fn get(&self, id: Uuid) -> RepoResult<Option<Certificate>>;
    async fn insert(&self, draft: CertificateDraft) -> RepoResult<Certificate>;
    async fn update(&self, id: Uuid, draft: CertificateDraft)
        -> RepoResult<Option<Certificate>>;
    async fn delete(&self, id: Uuid) -> RepoResult<bool>;
}

/// Skills, ordered by category then `display_order`.
#[async_trait]
pub trait SkillRepo: Send + Sync {
    async fn list(&self) -> RepoResult<Vec<Skill>>;
    async fn get(&self, id: Uuid) -> RepoResult<Option<Skill>>;
    async fn insert(&self, draft: SkillDraft) -> RepoResult<Skill>;
    async fn update(&self, id: Uuid, draft: SkillDraft) -> RepoResult<Option<Skill>>;
    async fn delete(&self, id: Uuid) -> RepoResult<bool>;
}

/// Contact messages, newest first.
#[async_trait]
pub trait MessageRepo: Send + Sync {
    async fn insert(&self, message: NewContactMessage) -> RepoResult<ContactMessage>;
    async fn list(&self) -> RepoResult<Vec<ContactMessage>>;
    async fn mark_read(&self, id: Uuid) -> RepoResult<bool>;
    async fn delete(&self, id: Uuid) -> RepoResult<bool>;
    async fn count(&self) -> RepoResult<i64>;
    async fn count_unread(&self) -> RepoResult<i64>;
}

/// Site settings: a flat string-to-string table keyed by setting name.
#[async_trait]
pub trait SettingsRepo: Send + Sync {
    async fn all(&self) -> RepoResult<BTreeMap<String, String>>;
    async fn get(&self, key: &str) -> RepoResult<Option<String>>;
    /// Insert or overwrite; last write wins.
    async fn upsert(&self, key: &str, value: &str) -> RepoResult<()>;
}

/// Accounts and the per-user admin flag stored on their profile.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>>;
    /// Fails with `RepoError::Conflict` when the email is registered.
    async fn create(&self, email: &str, password_hash: &str) -> RepoResult<User>;
    /// `profiles.is_admin`; `None` when there is no profile or the flag is null.
    async fn profile_admin_flag(&self, user_id: Uuid) -> RepoResult<Option<bool>>;
}
