/**
 * Home Route
 * Everything the landing page needs in one round trip
 */
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;

use crate::db::models::{Certificate, Project};
use crate::error::ApiError;
use crate::routes::blog::BlogPostSummary;
use crate::routes::settings::SiteContent;
use crate::routes::skills::{group_by_category, SkillGroup};
use crate::routes::LangQuery;
use crate::state::AppState;

const FEATURED_PROJECTS: i64 = 6;
const LATEST_POSTS: i64 = 3;
const HOME_CERTIFICATES: i64 = 6;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeResponse {
    pub featured_projects: Vec<Project>,
    pub latest_posts: Vec<BlogPostSummary>,
    pub certificates: Vec<Certificate>,
    pub skills: Vec<SkillGroup>,
    pub site: SiteContent,
}

/// GET /api/home
pub async fn home(
    State(state): State<AppState>,
    Query(lang): Query<LangQuery>,
) -> Result<Json<HomeResponse>, ApiError> {
    let lang = lang.language();
    let (featured_projects, posts, certificates, skills, settings) = tokio::try_join!(
        state.projects.list_featured(FEATURED_PROJECTS),
        state.posts.list_published(None, Some(LATEST_POSTS)),
        state.certificates.list(Some(HOME_CERTIFICATES)),
        state.skills.list(),
        state.settings.all(),
    )?;

    Ok(Json(HomeResponse {
        featured_projects,
        latest_posts: posts
            .iter()
            .map(|p| BlogPostSummary::from_post(p, lang))
            .collect(),
        certificates,
        skills: group_by_category(skills),
        site: SiteContent::build(&settings, state.storage.as_ref()),
    }))
}
