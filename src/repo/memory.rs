//! In-memory repositories.
//!
//! Used when no database is configured and by the test suites. Ordering and
//! conflict rules match the Postgres implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    BlogPostRepo, CertificateRepo, MessageRepo, ProjectRepo, SettingsRepo, SkillRepo, UserRepo,
};
use crate::db::models::{
    BlogPost, BlogPostDraft, Certificate, CertificateDraft, ContactMessage, NewContactMessage,
    Project, ProjectDraft, Skill, SkillDraft, User,
};
use crate::error::{RepoError, RepoResult};

fn take<T>(items: Vec<T>, limit: Option<i64>) -> Vec<T> {
    match limit {
        Some(n) => items.into_iter().take(n.max(0) as usize).collect(),
        None => items,
    }
}

#[derive(Default)]
pub struct MemoryProjectRepo {
    rows: RwLock<Vec<Project>>,
}

impl MemoryProjectRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectRepo for MemoryProjectRepo {
    async fn list(&self) -> RepoResult<Vec<Project>> {
        let mut rows = self.rows.read().await.clone();
        rows.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(rows)
    }

    async fn list_featured(&self, limit: i64) -> RepoResult<Vec<Project>> {
        let rows = self.list().await?.into_iter().filter(|p| p.featured).collect();
        Ok(take(rows, Some(limit)))
    }

    async fn get(&self, id: Uuid) -> RepoResult<Option<Project>> {
        Ok(self.rows.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, draft: ProjectDraft) -> RepoResult<Project> {
        let project = Project {
            id: Uuid::new_v4(),
            title_en: draft.title_en,
            title_om: draft.title_om,
            description_en: draft.description_en,
            description_om: draft.description_om,
            technologies: draft.technologies,
            github_url: draft.github_url,
            live_url: draft.live_url,
            image_url: draft.image_url,
            featured: draft.featured,
            display_order: draft.display_order,
            created_at: Utc::now(),
        };
        self.rows.write().await.push(project.clone());
        Ok(project)
    }

    async fn update(&self, id: Uuid, draft: ProjectDraft) -> RepoResult<Option<Project>> {
        let mut rows = self.rows.write().await;
        let Some(project) = rows.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        project.title_en = draft.title_en;
        project.title_om = draft.title_om;
        project.description_en = draft.description_en;
        project.description_om = draft.description_om;
        project.technologies = draft.technologies;
        project.github_url = draft.github_url;
        project.live_url = draft.live_url;
        project.image_url = draft.image_url;
        project.featured = draft.featured;
        project.display_order = draft.display_order;
        Ok(Some(project.clone()))
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|p| p.id != id);
        Ok(rows.len() != before)
    }

    async fn count(&self) -> RepoResult<i64> {
        Ok(self.rows.read().await.len() as i64)
    }
}

#[derive(Default)]
pub struct MemoryBlogPostRepo {
    rows: RwLock<Vec<BlogPost>>,
}

impl MemoryBlogPostRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn newest_published_first(rows: &mut [BlogPost]) {
        // NULLS LAST
        rows.sort_by(|a, b| match (a.published_at, b.published_at) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
    }
}

#[async_trait]
impl BlogPostRepo for MemoryBlogPostRepo {
    async fn list_all(&self) -> RepoResult<Vec<BlogPost>> {
        let mut rows = self.rows.read().await.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn list_published(
        &self,
        tag: Option<&str>,
        limit: Option<i64>,
    ) -> RepoResult<Vec<BlogPost>> {
        let mut rows: Vec<BlogPost> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|p| p.published)
            .filter(|p| tag.is_none_or(|t| p.tags.iter().any(|pt| pt == t)))
            .cloned()
            .collect();
        Self::newest_published_first(&mut rows);
        Ok(take(rows, limit))
    }

    async fn published_tags(&self) -> RepoResult<Vec<String>> {
        let mut tags: Vec<String> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|p| p.published)
            .flat_map(|p| p.tags.iter().cloned())
            .collect();
        tags.sort();
        tags.dedup();
        Ok(tags)
    }

    async fn get(&self, id: Uuid) -> RepoResult<Option<BlogPost>> {
        Ok(self.rows.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn get_published_by_slug(&self, slug: &str) -> RepoResult<Option<BlogPost>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|p| p.published && p.slug == slug)
            .cloned())
    }

    async fn related(
        &self,
        exclude: Uuid,
        tags: &[String],
        limit: i64,
    ) -> RepoResult<Vec<BlogPost>> {
        let mut rows: Vec<BlogPost> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|p| p.published && p.id != exclude)
            .filter(|p| p.tags.iter().any(|t| tags.contains(t)))
            .cloned()
            .collect();
        Self::newest_published_first(&mut rows);
        Ok(take(rows, Some(limit)))
    }

    async fn insert(&self, draft: BlogPostDraft) -> RepoResult<BlogPost> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|p| p.slug == draft.slug) {
            return Err(RepoError::Conflict("Slug already exists".to_string()));
        }
        let now = Utc::now();
        let post = BlogPost {
            id: Uuid::new_v4(),
            slug: draft.slug,
            title_en: draft.title_en,
            title_om: draft.title_om,
            excerpt_en: draft.excerpt_en,
            excerpt_om: draft.excerpt_om,
            content_en: draft.content_en,
            content_om: draft.content_om,
            image_url: draft.image_url,
            tags: draft.tags,
            published: draft.published,
            published_at: draft.published_at,
            created_at: now,
            updated_at: now,
        };
        rows.push(post.clone());
        Ok(post)
    }

    async fn update(&self, id: Uuid, draft: BlogPostDraft) -> RepoResult<Option<BlogPost>> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|p| p.slug == draft.slug && p.id != id) {
            return Err(RepoError::Conflict("Slug already exists".to_string()));
        }
        let Some(post) = rows.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        post.slug = draft.slug;
        post.title_en = draft.title_en;
        post.title_om = draft.title_om;
        post.excerpt_en = draft.excerpt_en;
        post.excerpt_om = draft.excerpt_om;
        post.content_en = draft.content_en;
        post.content_om = draft.content_om;
        post.image_url = draft.image_url;
        post.tags = draft.tags;
        post.published = draft.published;
        post.published_at = draft.published_at;
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn set_published(
        &self,
        id: Uuid,
        published: bool,
        published_at: Option<DateTime<Utc>>,
    ) -> RepoResult<Option<BlogPost>> {
        let mut rows = self.rows.write().await;
        let Some(post) = rows.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        post.published = published;
        post.published_at = published_at;
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|p| p.id != id);
        Ok(rows.len() != before)
    }

    async fn count(&self) -> RepoResult<i64> {
        Ok(self.rows.read().await.len() as i64)
    }
}

#[derive(Default)]
pub struct MemoryCertificateRepo {
    rows: RwLock<Vec<Certificate>>,
}

impl MemoryCertificateRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CertificateRepo for MemoryCertificateRepo {
    async fn list(&self, limit: Option<i64>) -> RepoResult<Vec<Certificate>> {
        let mut rows = self.rows.read().await.clone();
        rows.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(take(rows, limit))
    }

    async fn get(&self, id: Uuid) -> RepoResult<Option<Certificate>> {
        Ok(self.rows.read().await.iter().find(|c| c.id == id).cloned())
    }

    async fn insert(&self, draft: CertificateDraft) -> RepoResult<Certificate> {
        let certificate = Certificate {
            id: Uuid::new_v4(),
            title_en: draft.title_en,
            title_om: draft.title_om,
            issuer: draft.issuer,
            credential_url: draft.credential_url,
            image_url: draft.image_url,
            issued_at: draft.issued_at,
            display_order: draft.display_order,
            created_at: Utc::now(),
        };
        self.rows.write().await.push(certificate.clone());
        Ok(certificate)
    }

    async fn update(
        &self,
        id: Uuid,
        draft: CertificateDraft,
    ) -> RepoResult<Option<Certificate>> {
        let mut rows = self.rows.write().await;
        let Some(certificate) = rows.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        certificate.title_en = draft.title_en;
        certificate.title_om = draft.title_om;
        certificate.issuer = draft.issuer;
        certificate.credential_url = draft.credential_url;
        certificate.image_url = draft.image_url;
        certificate.issued_at = draft.issued_at;
        certificate.display_order = draft.display_order;
        Ok(Some(certificate.clone()))
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|c| c.id != id);
        Ok(rows.len() != before)
    }
}

#[derive(Default)]
pub struct MemorySkillRepo {
    rows: RwLock<Vec<Skill>>,
}

impl MemorySkillRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SkillRepo for MemorySkillRepo {
    async fn list(&self) -> RepoResult<Vec<Skill>> {
        let mut rows = self.rows.read().await.clone();
        rows.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then(a.display_order.cmp(&b.display_order))
        });
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> RepoResult<Option<Skill>> {
        Ok(self.rows.read().await.iter().find(|s| s.id == id).cloned())
    }

    async fn insert(&self, draft: SkillDraft) -> RepoResult<Skill> {
        let skill = Skill {
            id: Uuid::new_v4(),
            category: draft.category,
            name: draft.name,
            level: draft.level,
            display_order: draft.display_order,
            created_at: Utc::now(),
        };
        self.rows.write().await.push(skill.clone());
        Ok(skill)
    }

    async fn update(&self, id: Uuid, draft: SkillDraft) -> RepoResult<Option<Skill>> {
        let mut rows = self.rows.write().await;
        let Some(skill) = rows.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        skill.category = draft.category;
        skill.name = draft.name;
        skill.level = draft.level;
        skill.display_order = draft.display_order;
        Ok(Some(skill.clone()))
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|s| s.id != id);
        Ok(rows.len() != before)
    }
}

#[derive(Default)]
pub struct MemoryMessageRepo {
    rows: RwLock<Vec<ContactMessage>>,
}

impl MemoryMessageRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepo for MemoryMessageRepo {
    async fn insert(&self, message: NewContactMessage) -> RepoResult<ContactMessage> {
        let stored = ContactMessage {
            id: Uuid::new_v4(),
            name: message.name,
            email: message.email,
            subject: message.subject,
            message: message.message,
            read: false,
            created_at: Utc::now(),
        };
        self.rows.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self) -> RepoResult<Vec<ContactMessage>> {
        let mut rows = self.rows.read().await.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn mark_read(&self, id: Uuid) -> RepoResult<bool> {
        let mut rows = self.rows.write().await;
        match rows.iter_mut().find(|m| m.id == id) {
            Some(message) => {
                message.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|m| m.id != id);
        Ok(rows.len() != before)
    }

    async fn count(&self) -> RepoResult<i64> {
        Ok(self.rows.read().await.len() as i64)
    }

    async fn count_unread(&self) -> RepoResult<i64> {
        Ok(self.rows.read().await.iter().filter(|m| !m.read).count() as i64)
    }
}

#[derive(Default)]
pub struct MemorySettingsRepo {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemorySettingsRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsRepo for MemorySettingsRepo {
    async fn all(&self) -> RepoResult<BTreeMap<String, String>> {
        Ok(self.values.read().await.clone())
    }

    async fn get(&self, key: &str) -> RepoResult<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn upsert(&self, key: &str, value: &str) -> RepoResult<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryUserRepo {
    users: RwLock<Vec<User>>,
    profile_flags: RwLock<HashMap<Uuid, Option<bool>>>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `profiles.is_admin` for a user.
    pub async fn set_profile_admin(&self, user_id: Uuid, flag: Option<bool>) {
        self.profile_flags.write().await.insert(user_id, flag);
    }

    /// Replace a user's metadata blob.
    pub async fn set_metadata(&self, user_id: Uuid, metadata: serde_json::Value) {
        if let Some(user) = self.users.write().await.iter_mut().find(|u| u.id == user_id) {
            user.user_metadata = metadata;
        }
    }
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, email: &str, password_hash: &str) -> RepoResult<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Err(RepoError::Conflict("Email already registered".to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            user_metadata: serde_json::json!({}),
            created_at: Utc::now(),
        };
        users.push(user.clone());
        self.profile_flags.write().await.insert(user.id, None);
        Ok(user)
    }

    async fn profile_admin_flag(&self, user_id: Uuid) -> RepoResult<Option<bool>> {
        Ok(self
            .profile_flags
            .read()
            .await
            .get(&user_id)
            .copied()
            .flatten())
    }
}
