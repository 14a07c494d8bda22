/**
 * Skill Routes
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::{Skill, SkillDraft};
use crate::error::ApiError;
use crate::routes::{require_text, ApiJson, DeleteQuery, SaveRequest, SuccessResponse};
use crate::session::AdminUser;
use crate::state::AppState;

/// Skills sharing a category, in display order.
#[derive(Debug, Serialize, Deserialize)]
pub struct SkillGroup {
    pub category: String,
    pub skills: Vec<Skill>,
}

/// Group an already category-ordered list, keeping first-seen category order.
pub fn group_by_category(skills: Vec<Skill>) -> Vec<SkillGroup> {
    let mut groups: Vec<SkillGroup> = Vec::new();
    for skill in skills {
        match groups.iter_mut().find(|g| g.category == skill.category) {
            Some(group) => group.skills.push(skill),
            None => groups.push(SkillGroup {
                category: skill.category.clone(),
                skills: vec![skill],
            }),
        }
    }
    groups
}

fn prepare_draft(mut draft: SkillDraft) -> Result<SkillDraft, ApiError> {
    require_text(&draft.category, "Category is required")?;
    require_text(&draft.name, "Name is required")?;
    if !(0..=100).contains(&draft.level) {
        return Err(ApiError::validation("Level must be between 0 and 100"));
    }
    draft.category = draft.category.trim().to_string();
    draft.name = draft.name.trim().to_string();
    Ok(draft)
}

/// GET /api/skills - Grouped by category
pub async fn list_skills(State(state): State<AppState>) -> Result<Json<Vec<SkillGroup>>, ApiError> {
    Ok(Json(group_by_category(state.skills.list().await?)))
}

/// GET /api/admin/skills - Flat list for editing
pub async fn admin_list_skills(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Skill>>, ApiError> {
    Ok(Json(state.skills.list().await?))
}

/// POST /api/admin/skills - Create or update
pub async fn save_skill(
    _admin: AdminUser,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SaveRequest<SkillDraft>>,
) -> Result<(StatusCode, Json<Skill>), ApiError> {
    let draft = prepare_draft(request.draft)?;
    match request.id {
        Some(id) => {
            let skill = state
                .skills
                .update(id, draft)
                .await?
                .ok_or_else(|| ApiError::not_found("Skill"))?;
            Ok((StatusCode::OK, Json(skill)))
        }
        None => Ok((StatusCode::CREATED, Json(state.skills.insert(draft).await?))),
    }
}

/// DELETE /api/admin/skills/{id}?confirm=true
pub async fn delete_skill(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(confirm): Query<DeleteQuery>,
) -> Result<Json<SuccessResponse>, ApiError> {
    confirm.require()?;
    if !state.skills.delete(id).await? {
        return Err(ApiError::not_found("Skill"));
    }
    Ok(Json(SuccessResponse::ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn skill(category: &str, name: &str, order: i32) -> Skill {
        Skill {
            id: Uuid::new_v4(),
            category: category.to_string(),
            name: name.to_string(),
            level: 80,
            display_order: order,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_group_by_category_keeps_order() {
        let groups = group_by_category(vec![
            skill("Backend", "Rust", 0),
            skill("Backend", "Go", 1),
            skill("Cloud", "AWS", 0),
        ]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].category, "Backend");
        assert_eq!(groups[0].skills.len(), 2);
        assert_eq!(groups[1].skills[0].name, "AWS");
    }

    #[test]
    fn test_level_bounds() {
        let draft = SkillDraft {
            category: "Backend".to_string(),
            name: "Rust".to_string(),
            level: 101,
            display_order: 0,
        };
        assert!(prepare_draft(draft).is_err());
    }
}
