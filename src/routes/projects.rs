/**
 * Project Routes
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::db::models::{Project, ProjectDraft};
use crate::error::ApiError;
use crate::routes::{
    clean_list, non_blank, require_text, require_url, ApiJson, DeleteQuery, SaveRequest,
    SuccessResponse,
};
use crate::session::AdminUser;
use crate::state::AppState;

fn prepare_draft(mut draft: ProjectDraft) -> Result<ProjectDraft, ApiError> {
    require_text(&draft.title_en, "Title is required")?;
    require_text(&draft.description_en, "Description is required")?;

    draft.title_en = draft.title_en.trim().to_string();
    draft.description_en = draft.description_en.trim().to_string();
    draft.title_om = non_blank(draft.title_om);
    draft.description_om = non_blank(draft.description_om);
    draft.github_url = non_blank(draft.github_url);
    draft.live_url = non_blank(draft.live_url);
    draft.image_url = non_blank(draft.image_url);
    draft.technologies = clean_list(draft.technologies);

    if let Some(url) = &draft.github_url {
        require_url(url, "GitHub URL")?;
    }
    if let Some(url) = &draft.live_url {
        require_url(url, "Live URL")?;
    }
    Ok(draft)
}

/// GET /api/projects
pub async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<Project>>, ApiError> {
    Ok(Json(state.projects.list().await?))
}

/// GET /api/projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, ApiError> {
    state
        .projects
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Project"))
}

/// GET /api/admin/projects
pub async fn admin_list_projects(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Project>>, ApiError> {
    Ok(Json(state.projects.list().await?))
}

/// POST /api/admin/projects - Create or update
pub async fn save_project(
    _admin: AdminUser,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SaveRequest<ProjectDraft>>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let draft = prepare_draft(request.draft)?;
    match request.id {
        Some(id) => {
            let project = state
                .projects
                .update(id, draft)
                .await?
                .ok_or_else(|| ApiError::not_found("Project"))?;
            tracing::info!(project_id = %id, "project updated");
            Ok((StatusCode::OK, Json(project)))
        }
        None => {
            let project = state.projects.insert(draft).await?;
            tracing::info!(project_id = %project.id, "project created");
            Ok((StatusCode::CREATED, Json(project)))
        }
    }
}

/// DELETE /api/admin/projects/{id}?confirm=true
pub async fn delete_project(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(confirm): Query<DeleteQuery>,
) -> Result<Json<SuccessResponse>, ApiError> {
    confirm.require()?;
    if !state.projects.delete(id).await? {
        return Err(ApiError::not_found("Project"));
    }
    tracing::info!(project_id = %id, "project deleted");
    Ok(Json(SuccessResponse::ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_draft_requires_english_fields() {
        let err = prepare_draft(ProjectDraft::default()).unwrap_err();
        assert_eq!(err.to_string(), "Title is required");

        let draft = ProjectDraft {
            title_en: "Site".to_string(),
            ..Default::default()
        };
        assert_eq!(
            prepare_draft(draft).unwrap_err().to_string(),
            "Description is required"
        );
    }

    #[test]
    fn test_prepare_draft_normalizes_optional_fields() {
        let draft = ProjectDraft {
            title_en: "Site".to_string(),
            description_en: "A site".to_string(),
            title_om: Some("".to_string()),
            github_url: Some(" https://github.com/me/site ".to_string()),
            technologies: vec!["Rust".to_string(), "".to_string()],
            ..Default::default()
        };
        let draft = prepare_draft(draft).unwrap();
        assert_eq!(draft.title_om, None);
        assert_eq!(draft.github_url.as_deref(), Some("https://github.com/me/site"));
        assert_eq!(draft.technologies, vec!["Rust"]);
    }

    #[test]
    fn test_prepare_draft_rejects_bad_url() {
        let draft = ProjectDraft {
            title_en: "Site".to_string(),
            description_en: "A site".to_string(),
            live_url: Some("javascript:alert(1)".to_string()),
            ..Default::default()
        };
        assert!(prepare_draft(draft).is_err());
    }
}
