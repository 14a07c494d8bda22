//! Postgres-backed repositories (sqlx).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{
    BlogPostRepo, CertificateRepo, MessageRepo, ProjectRepo, SettingsRepo, SkillRepo, UserRepo,
};
use crate::db::models::{
    BlogPost, BlogPostDraft, Certificate, CertificateDraft, ContactMessage, NewContactMessage,
    Project, ProjectDraft, Skill, SkillDraft, User,
};
use crate::error::{RepoError, RepoResult};

const PROJECT_COLUMNS: &str = "id, title_en, title_om, description_en, description_om, \
     technologies, github_url, live_url, image_url, featured, display_order, created_at";

const POST_COLUMNS: &str = "id, slug, title_en, title_om, excerpt_en, excerpt_om, content_en, \
     content_om, image_url, tags, published, published_at, created_at, updated_at";

const CERTIFICATE_COLUMNS: &str = "id, title_en, title_om, issuer, credential_url, image_url, \
     issued_at, display_order, created_at";

const SKILL_COLUMNS: &str = "id, category, name, level, display_order, created_at";

const MESSAGE_COLUMNS: &str = "id, name, email, subject, message, read, created_at";

const USER_COLUMNS: &str = "id, email, password_hash, user_metadata, created_at";

/// Map a unique-constraint violation to `Conflict`, everything else to `Database`.
fn conflict_on_unique(err: sqlx::Error, what: &str) -> RepoError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return RepoError::Conflict(what.to_string());
        }
    }
    RepoError::Database(err)
}

#[derive(Clone)]
pub struct PgProjectRepo {
    pool: PgPool,
}

impl PgProjectRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepo for PgProjectRepo {
    async fn list(&self) -> RepoResult<Vec<Project>> {
        let sql = format!(
            "SELECT {} FROM projects ORDER BY display_order ASC, created_at ASC",
            PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_featured(&self, limit: i64) -> RepoResult<Vec<Project>> {
        let sql = format!(
            "SELECT {} FROM projects WHERE featured = true \
             ORDER BY display_order ASC, created_at ASC LIMIT $1",
            PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get(&self, id: Uuid) -> RepoResult<Option<Project>> {
        let sql = format!("SELECT {} FROM projects WHERE id = $1", PROJECT_COLUMNS);
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert(&self, draft: ProjectDraft) -> RepoResult<Project> {
        let sql = format!(
            r#"
            INSERT INTO projects (title_en, title_om, description_en, description_om,
                technologies, github_url, live_url, image_url, featured, display_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(&draft.title_en)
            .bind(&draft.title_om)
            .bind(&draft.description_en)
            .bind(&draft.description_om)
            .bind(&draft.technologies)
            .bind(&draft.github_url)
            .bind(&draft.live_url)
            .bind(&draft.image_url)
            .bind(draft.featured)
            .bind(draft.display_order)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update(&self, id: Uuid, draft: ProjectDraft) -> RepoResult<Option<Project>> {
        let sql = format!(
            r#"
            UPDATE projects
            SET title_en = $1, title_om = $2, description_en = $3, description_om = $4,
                technologies = $5, github_url = $6, live_url = $7, image_url = $8,
                featured = $9, display_order = $10
            WHERE id = $11
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(&draft.title_en)
            .bind(&draft.title_om)
            .bind(&draft.description_en)
            .bind(&draft.description_om)
            .bind(&draft.technologies)
            .bind(&draft.github_url)
            .bind(&draft.live_url)
            .bind(&draft.image_url)
            .bind(draft.featured)
            .bind(draft.display_order)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> RepoResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[derive(Clone)]
pub struct PgBlogPostRepo {
    pool: PgPool,
}

impl PgBlogPostRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlogPostRepo for PgBlogPostRepo {
    async fn list_all(&self) -> RepoResult<Vec<BlogPost>> {
        let sql = format!(
            "SELECT {} FROM blog_posts ORDER BY created_at DESC",
            POST_COLUMNS
        );
        Ok(sqlx::query_as::<_, BlogPost>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_published(
        &self,
        tag: Option<&str>,
        limit: Option<i64>,
    ) -> RepoResult<Vec<BlogPost>> {
        // NULL tag disables the containment filter, NULL limit means no limit.
        let sql = format!(
            r#"
            SELECT {} FROM blog_posts
            WHERE published = true
              AND ($1::TEXT IS NULL OR tags @> ARRAY[$1::TEXT])
            ORDER BY published_at DESC NULLS LAST
            LIMIT $2
            "#,
            POST_COLUMNS
        );
        Ok(sqlx::query_as::<_, BlogPost>(&sql)
            .bind(tag)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn published_tags(&self) -> RepoResult<Vec<String>> {
        Ok(sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT unnest(tags) AS tag FROM blog_posts
            WHERE published = true
            ORDER BY tag
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get(&self, id: Uuid) -> RepoResult<Option<BlogPost>> {
        let sql = format!("SELECT {} FROM blog_posts WHERE id = $1", POST_COLUMNS);
        Ok(sqlx::query_as::<_, BlogPost>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_published_by_slug(&self, slug: &str) -> RepoResult<Option<BlogPost>> {
        let sql = format!(
            "SELECT {} FROM blog_posts WHERE slug = $1 AND published = true",
            POST_COLUMNS
        );
        Ok(sqlx::query_as::<_, BlogPost>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn related(
        &self,
        exclude: Uuid,
        tags: &[String],
        limit: i64,
    ) -> RepoResult<Vec<BlogPost>> {
        if tags.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!(
            r#"
            SELECT {} FROM blog_posts
            WHERE published = true AND id <> $1 AND tags && $2
            ORDER BY published_at DESC NULLS LAST
            LIMIT $3
            "#,
            POST_COLUMNS
        );
        Ok(sqlx::query_as::<_, BlogPost>(&sql)
            .bind(exclude)
            .bind(tags)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert(&self, draft: BlogPostDraft) -> RepoResult<BlogPost> {
        let sql = format!(
            r#"
            INSERT INTO blog_posts (slug, title_en, title_om, excerpt_en, excerpt_om,
                content_en, content_om, image_url, tags, published, published_at,
                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, now(), now())
            RETURNING {}
            "#,
            POST_COLUMNS
        );
        sqlx::query_as::<_, BlogPost>(&sql)
            .bind(&draft.slug)
            .bind(&draft.title_en)
            .bind(&draft.title_om)
            .bind(&draft.excerpt_en)
            .bind(&draft.excerpt_om)
            .bind(&draft.content_en)
            .bind(&draft.content_om)
            .bind(&draft.image_url)
            .bind(&draft.tags)
            .bind(draft.published)
            .bind(draft.published_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "Slug already exists"))
    }

    async fn update(&self, id: Uuid, draft: BlogPostDraft) -> RepoResult<Option<BlogPost>> {
        let sql = format!(
            r#"
            UPDATE blog_posts
            SET slug = $1, title_en = $2, title_om = $3, excerpt_en = $4, excerpt_om = $5,
                content_en = $6, content_om = $7, image_url = $8, tags = $9,
                published = $10, published_at = $11, updated_at = now()
            WHERE id = $12
            RETURNING {}
            "#,
            POST_COLUMNS
        );
        sqlx::query_as::<_, BlogPost>(&sql)
            .bind(&draft.slug)
            .bind(&draft.title_en)
            .bind(&draft.title_om)
            .bind(&draft.excerpt_en)
            .bind(&draft.excerpt_om)
            .bind(&draft.content_en)
            .bind(&draft.content_om)
            .bind(&draft.image_url)
            .bind(&draft.tags)
            .bind(draft.published)
            .bind(draft.published_at)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "Slug already exists"))
    }

    async fn set_published(
        &self,
        id: Uuid,
        published: bool,
        published_at: Option<DateTime<Utc>>,
    ) -> RepoResult<Option<BlogPost>> {
        let sql = format!(
            r#"
            UPDATE blog_posts
            SET published = $1, published_at = $2, updated_at = now()
            WHERE id = $3
            RETURNING {}
            "#,
            POST_COLUMNS
        );
        Ok(sqlx::query_as::<_, BlogPost>(&sql)
            .bind(published)
            .bind(published_at)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> RepoResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM blog_posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[derive(Clone)]
pub struct PgCertificateRepo {
    pool: PgPool,
}

impl PgCertificateRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CertificateRepo for PgCertificateRepo {
    async fn list(&self, limit: Option<i64>) -> RepoResult<Vec<Certificate>> {
        let sql = format!(
            "SELECT {} FROM certificates ORDER BY display_order ASC, created_at ASC LIMIT $1",
            CERTIFICATE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Certificate>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get(&self, id: Uuid) -> RepoResult<Option<Certificate>> {
        let sql = format!(
            "SELECT {} FROM certificates WHERE id = $1",
            CERTIFICATE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Certificate>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert(&self, draft: CertificateDraft) -> RepoResult<Certificate> {
        let sql = format!(
            r#"
            INSERT INTO certificates (title_en, title_om, issuer, credential_url, image_url,
                issued_at, display_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            CERTIFICATE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Certificate>(&sql)
            .bind(&draft.title_en)
            .bind(&draft.title_om)
            .bind(&draft.issuer)
            .bind(&draft.credential_url)
            .bind(&draft.image_url)
            .bind(draft.issued_at)
            .bind(draft.display_order)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update(
        &self,
        id: Uuid,
        draft: CertificateDraft,
    ) -> RepoResult<Option<Certificate>> {
        let sql = format!(
            r#"
            UPDATE certificates
            SET title_en = $1, title_om = $2, issuer = $3, credential_url = $4,
                image_url = $5, issued_at = $6, display_order = $7
            WHERE id = $8
            RETURNING {}
            "#,
            CERTIFICATE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Certificate>(&sql)
            .bind(&draft.title_en)
            .bind(&draft.title_om)
            .bind(&draft.issuer)
            .bind(&draft.credential_url)
            .bind(&draft.image_url)
            .bind(draft.issued_at)
            .bind(draft.display_order)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM certificates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct PgSkillRepo {
    pool: PgPool,
}

impl PgSkillRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SkillRepo for PgSkillRepo {
    async fn list(&self) -> RepoResult<Vec<Skill>> {
        let sql = format!(
            "SELECT {} FROM skills ORDER BY category ASC, display_order ASC",
            SKILL_COLUMNS
        );
        Ok(sqlx::query_as::<_, Skill>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get(&self, id: Uuid) -> RepoResult<Option<Skill>> {
        let sql = format!("SELECT {} FROM skills WHERE id = $1", SKILL_COLUMNS);
        Ok(sqlx::query_as::<_, Skill>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert(&self, draft: SkillDraft) -> RepoResult<Skill> {
        let sql = format!(
            "INSERT INTO skills (category, name, level, display_order) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            SKILL_COLUMNS
        );
        Ok(sqlx::query_as::<_, Skill>(&sql)
            .bind(&draft.category)
            .bind(&draft.name)
            .bind(draft.level)
            .bind(draft.display_order)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update(&self, id: Uuid, draft: SkillDraft) -> RepoResult<Option<Skill>> {
        let sql = format!(
            "UPDATE skills SET category = $1, name = $2, level = $3, display_order = $4 \
             WHERE id = $5 RETURNING {}",
            SKILL_COLUMNS
        );
        Ok(sqlx::query_as::<_, Skill>(&sql)
            .bind(&draft.category)
            .bind(&draft.name)
            .bind(draft.level)
            .bind(draft.display_order)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM skills WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub struct PgMessageRepo {
    pool: PgPool,
}

impl PgMessageRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepo for PgMessageRepo {
    async fn insert(&self, message: NewContactMessage) -> RepoResult<ContactMessage> {
        let sql = format!(
            "INSERT INTO contact_messages (name, email, subject, message) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            MESSAGE_COLUMNS
        );
        Ok(sqlx::query_as::<_, ContactMessage>(&sql)
            .bind(&message.name)
            .bind(&message.email)
            .bind(&message.subject)
            .bind(&message.message)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list(&self) -> RepoResult<Vec<ContactMessage>> {
        let sql = format!(
            "SELECT {} FROM contact_messages ORDER BY created_at DESC",
            MESSAGE_COLUMNS
        );
        Ok(sqlx::query_as::<_, ContactMessage>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn mark_read(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("UPDATE contact_messages SET read = true WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM contact_messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> RepoResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contact_messages")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_unread(&self) -> RepoResult<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM contact_messages WHERE read = false")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

#[derive(Clone)]
pub struct PgSettingsRepo {
    pool: PgPool,
}

impl PgSettingsRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepo for PgSettingsRepo {
    async fn all(&self) -> RepoResult<BTreeMap<String, String>> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM site_settings")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().collect())
    }

    async fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM site_settings WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn upsert(&self, key: &str, value: &str) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO site_settings (key, value, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (key) DO UPDATE SET
                value = EXCLUDED.value,
                updated_at = now()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create(&self, email: &str, password_hash: &str) -> RepoResult<User> {
        let sql = format!(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "Email already registered"))?;

        sqlx::query("INSERT INTO profiles (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(user.id)
            .execute(&self.pool)
            .await?;

        Ok(user)
    }

    async fn profile_admin_flag(&self, user_id: Uuid) -> RepoResult<Option<bool>> {
        let row: Option<(Option<bool>,)> =
            sqlx::query_as("SELECT is_admin FROM profiles WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.and_then(|(flag,)| flag))
    }
}
