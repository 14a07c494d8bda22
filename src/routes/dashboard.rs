use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::session::AdminUser;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub projects: i64,
    pub blog_posts: i64,
    pub messages: i64,
    pub unread_messages: i64,
}

/// GET /api/admin/dashboard
pub async fn dashboard(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let (projects, blog_posts, messages, unread_messages) = tokio::try_join!(
        state.projects.count(),
        state.posts.count(),
        state.messages.count(),
        state.messages.count_unread(),
    )?;

    Ok(Json(DashboardResponse {
        projects,
        blog_posts,
        messages,
        unread_messages,
    }))
}
