/**
 * Blog Routes
 * Public reading API and admin management for blog posts
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content::{reading_time_minutes, BlogContent, SafeHtml, TocItem};
use crate::db::models::{BlogPost, BlogPostDraft, Language};
use crate::error::ApiError;
use crate::routes::{
    clean_list, non_blank, require_text, ApiJson, DeleteQuery, LangQuery, SaveRequest,
    SuccessResponse,
};
use crate::session::AdminUser;
use crate::state::AppState;

pub const POSTS_PER_PAGE: usize = 9;
pub const RELATED_POSTS: i64 = 3;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for GET /api/blog
#[derive(Debug, Default, Deserialize)]
pub struct BlogListQuery {
    pub tag: Option<String>,
    pub q: Option<String>,
    pub page: Option<usize>,
    pub lang: Option<String>,
}

/// Localized post card used by listings, the home page and related posts.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostSummary {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub reading_time_minutes: u32,
}

impl BlogPostSummary {
    pub fn from_post(post: &BlogPost, lang: Language) -> Self {
        Self {
            id: post.id,
            slug: post.slug.clone(),
            title: post.title(lang).to_string(),
            excerpt: post.excerpt(lang).map(str::to_string),
            image_url: post.image_url.clone(),
            tags: post.tags.clone(),
            published_at: post.published_at,
            reading_time_minutes: reading_time_minutes(post.content(lang)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogListResponse {
    pub posts: Vec<BlogPostSummary>,
    pub page: usize,
    pub total_pages: usize,
    pub total: usize,
    /// Every tag used by a published post, sorted.
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostResponse {
    pub id: Uuid,
    pub slug: String,
    pub lang: Language,
    pub title: String,
    pub excerpt: Option<String>,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub html: SafeHtml,
    pub table_of_contents: Vec<TocItem>,
    pub reading_time_minutes: u32,
    pub related: Vec<BlogPostSummary>,
}

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub published: bool,
}

#[derive(Debug, Deserialize)]
pub struct SlugQuery {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SlugResponse {
    pub slug: String,
}

// ============================================================================
// Slugs and publishing
// ============================================================================

lazy_static::lazy_static! {
    /// Valid slug pattern: lowercase letters, numbers, and hyphens
    static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
    static ref NON_ALNUM_RUN: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

fn is_valid_slug(slug: &str) -> bool {
    SLUG_REGEX.is_match(slug)
}

/// URL slug suggested for a post title.
pub fn generate_slug(title: &str) -> String {
    NON_ALNUM_RUN
        .replace_all(&title.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

/// `published_at` after moving a post to `target`.
///
/// Publishing stamps `now` unless the post is already live, in which case the
/// original date is kept; unpublishing clears it.
pub fn publish_transition(
    current: Option<(bool, Option<DateTime<Utc>>)>,
    target: bool,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if !target {
        return None;
    }
    match current {
        Some((true, Some(at))) => Some(at),
        _ => Some(now),
    }
}

fn prepare_draft(mut draft: BlogPostDraft) -> Result<BlogPostDraft, ApiError> {
    require_text(&draft.title_en, "Title is required")?;
    require_text(&draft.content_en, "Content is required")?;

    draft.title_en = draft.title_en.trim().to_string();
    draft.slug = match draft.slug.trim() {
        "" => generate_slug(&draft.title_en),
        slug => slug.to_string(),
    };
    if !is_valid_slug(&draft.slug) {
        return Err(ApiError::validation(
            "Slug must contain only lowercase letters, numbers, and hyphens",
        ));
    }

    draft.title_om = non_blank(draft.title_om);
    draft.excerpt_en = non_blank(draft.excerpt_en);
    draft.excerpt_om = non_blank(draft.excerpt_om);
    draft.content_om = non_blank(draft.content_om);
    draft.image_url = non_blank(draft.image_url);
    draft.tags = clean_list(draft.tags);
    Ok(draft)
}

fn matches_search(post: &BlogPost, needle: &str, lang: Language) -> bool {
    let needle = needle.to_lowercase();
    post.title(lang).to_lowercase().contains(&needle)
        || post
            .excerpt(lang)
            .is_some_and(|e| e.to_lowercase().contains(&needle))
}

// ============================================================================
// Public handlers
// ============================================================================

/// GET /api/blog - Published posts, newest first, 9 per page
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<BlogListQuery>,
) -> Result<Json<BlogListResponse>, ApiError> {
    let lang = LangQuery {
        lang: query.lang.clone(),
    }
    .language();
    let tag = query.tag.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let search = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());

    let tags = state.posts.published_tags().await?;
    let tagged = state.posts.list_published(tag, None).await?;

    let filtered: Vec<&BlogPost> = tagged
        .iter()
        .filter(|p| search.is_none_or(|q| matches_search(p, q, lang)))
        .collect();

    let total = filtered.len();
    let total_pages = total.div_ceil(POSTS_PER_PAGE).max(1);
    let page = query.page.unwrap_or(1).clamp(1, total_pages);

    let posts = filtered
        .into_iter()
        .skip((page - 1) * POSTS_PER_PAGE)
        .take(POSTS_PER_PAGE)
        .map(|p| BlogPostSummary::from_post(p, lang))
        .collect();

    Ok(Json(BlogListResponse {
        posts,
        page,
        total_pages,
        total,
        tags,
    }))
}

/// GET /api/blog/{slug} - A single published post rendered for reading
pub async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(lang): Query<LangQuery>,
) -> Result<Json<BlogPostResponse>, ApiError> {
    let lang = lang.language();
    let post = state
        .posts
        .get_published_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found("Post"))?;

    let content = BlogContent::derive(post.content(lang));
    let related = state
        .posts
        .related(post.id, &post.tags, RELATED_POSTS)
        .await?
        .iter()
        .map(|p| BlogPostSummary::from_post(p, lang))
        .collect();

    Ok(Json(BlogPostResponse {
        id: post.id,
        slug: post.slug.clone(),
        lang,
        title: post.title(lang).to_string(),
        excerpt: post.excerpt(lang).map(str::to_string),
        image_url: post.image_url.clone(),
        tags: post.tags.clone(),
        published_at: post.published_at,
        html: content.html,
        table_of_contents: content.table_of_contents,
        reading_time_minutes: content.reading_time_minutes,
        related,
    }))
}

// ============================================================================
// Admin handlers
// ============================================================================

/// GET /api/admin/blog - Every post, drafts included, newest first
pub async fn admin_list_posts(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<BlogPost>>, ApiError> {
    Ok(Json(state.posts.list_all().await?))
}

/// POST /api/admin/blog - Create or update a post
pub async fn save_post(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SaveRequest<BlogPostDraft>>,
) -> Result<(StatusCode, Json<BlogPost>), ApiError> {
    let mut draft = prepare_draft(request.draft)?;
    let now = Utc::now();

    match request.id {
        Some(id) => {
            let existing = state
                .posts
                .get(id)
                .await?
                .ok_or_else(|| ApiError::not_found("Post"))?;
            draft.published_at = publish_transition(
                Some((existing.published, existing.published_at)),
                draft.published,
                now,
            );
            let post = state
                .posts
                .update(id, draft)
                .await?
                .ok_or_else(|| ApiError::not_found("Post"))?;
            tracing::info!(post_id = %post.id, admin = %admin.email, "blog post updated");
            Ok((StatusCode::OK, Json(post)))
        }
        None => {
            draft.published_at = publish_transition(None, draft.published, now);
            let post = state.posts.insert(draft).await?;
            tracing::info!(post_id = %post.id, admin = %admin.email, "blog post created");
            Ok((StatusCode::CREATED, Json(post)))
        }
    }
}

/// PATCH /api/admin/blog/{id}/publish - Publish or unpublish
pub async fn set_published(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<PublishRequest>,
) -> Result<Json<BlogPost>, ApiError> {
    let existing = state
        .posts
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post"))?;
    let published_at = publish_transition(
        Some((existing.published, existing.published_at)),
        request.published,
        Utc::now(),
    );

    let post = state
        .posts
        .set_published(id, request.published, published_at)
        .await?
        .ok_or_else(|| ApiError::not_found("Post"))?;
    tracing::info!(post_id = %id, published = post.published, "blog post publish state changed");
    Ok(Json(post))
}

/// DELETE /api/admin/blog/{id}?confirm=true
pub async fn delete_post(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(confirm): Query<DeleteQuery>,
) -> Result<Json<SuccessResponse>, ApiError> {
    confirm.require()?;
    if !state.posts.delete(id).await? {
        return Err(ApiError::not_found("Post"));
    }
    tracing::info!(post_id = %id, "blog post deleted");
    Ok(Json(SuccessResponse::ok()))
}

/// GET /api/admin/blog/slug?title= - Suggested slug for a title
pub async fn suggest_slug(_admin: AdminUser, Query(query): Query<SlugQuery>) -> Json<SlugResponse> {
    Json(SlugResponse {
        slug: generate_slug(&query.title),
    })
}
