/**
 * Site Settings Routes
 * Public site content (hero, about, social links) and admin key/value editing
 */
use axum::{extract::State, Json};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ApiError;
use crate::routes::ApiJson;
use crate::session::AdminUser;
use crate::state::AppState;
use crate::storage::ObjectStore;

pub const RESUME_URL_KEY: &str = "resume_url";
pub const PROFILE_IMAGE_URL_KEY: &str = "profile_image_url";

const MAX_VALUE_CHARS: usize = 10_000;

lazy_static::lazy_static! {
    static ref SETTING_KEY_REGEX: Regex = Regex::new(r"^[a-z0-9_]{1,64}$").unwrap();
}

type Settings = BTreeMap<String, String>;

/// Trimmed setting value, `None` when missing or blank.
pub fn setting(settings: &Settings, key: &str) -> Option<String> {
    settings
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SocialLinks {
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub telegram_url: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroContent {
    pub greeting_en: Option<String>,
    pub greeting_om: Option<String>,
    pub name_en: Option<String>,
    pub name_om: Option<String>,
    pub role_en: Option<String>,
    pub role_om: Option<String>,
    pub subtitle_en: Option<String>,
    pub subtitle_om: Option<String>,
    pub description_en: Option<String>,
    pub description_om: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutContent {
    pub title_en: Option<String>,
    pub title_om: Option<String>,
    pub description_en: Option<String>,
    pub description_om: Option<String>,
    pub education_en: Option<String>,
    pub education_om: Option<String>,
    pub education_text_en: Option<String>,
    pub education_text_om: Option<String>,
    pub experience_en: Option<String>,
    pub experience_om: Option<String>,
    pub experience_text_en: Option<String>,
    pub experience_text_om: Option<String>,
    pub interests_en: Option<String>,
    pub interests_om: Option<String>,
    pub interests_text_en: Option<String>,
    pub interests_text_om: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteContent {
    pub social: SocialLinks,
    pub hero: HeroContent,
    pub about: AboutContent,
    pub profile_image_url: Option<String>,
    pub resume_download_href: Option<String>,
}

impl SocialLinks {
    pub fn from_settings(s: &Settings) -> Self {
        Self {
            github_url: setting(s, "github_url"),
            linkedin_url: setting(s, "linkedin_url"),
            telegram_url: setting(s, "telegram_url"),
            email: setting(s, "email"),
        }
    }
}

impl HeroContent {
    pub fn from_settings(s: &Settings) -> Self {
        Self {
            greeting_en: setting(s, "hero_greeting_en"),
            greeting_om: setting(s, "hero_greeting_om"),
            name_en: setting(s, "hero_name_en"),
            name_om: setting(s, "hero_name_om"),
            role_en: setting(s, "hero_role_en"),
            role_om: setting(s, "hero_role_om"),
            subtitle_en: setting(s, "hero_subtitle_en"),
            subtitle_om: setting(s, "hero_subtitle_om"),
            description_en: setting(s, "hero_description_en"),
            description_om: setting(s, "hero_description_om"),
        }
    }
}

impl AboutContent {
    pub fn from_settings(s: &Settings) -> Self {
        Self {
            title_en: setting(s, "about_title_en"),
            title_om: setting(s, "about_title_om"),
            description_en: setting(s, "about_description_en"),
            description_om: setting(s, "about_description_om"),
            education_en: setting(s, "about_education_en"),
            education_om: setting(s, "about_education_om"),
            education_text_en: setting(s, "about_education_text_en"),
            education_text_om: setting(s, "about_education_text_om"),
            experience_en: setting(s, "about_experience_en"),
            experience_om: setting(s, "about_experience_om"),
            experience_text_en: setting(s, "about_experience_text_en"),
            experience_text_om: setting(s, "about_experience_text_om"),
            interests_en: setting(s, "about_interests_en"),
            interests_om: setting(s, "about_interests_om"),
            interests_text_en: setting(s, "about_interests_text_en"),
            interests_text_om: setting(s, "about_interests_text_om"),
        }
    }
}

/// Link for the "download resume" button: our own redirect endpoint when the
/// resume lives in our storage, the external URL otherwise.
pub fn resume_download_href(settings: &Settings, storage: &dyn ObjectStore) -> Option<String> {
    let url = setting(settings, RESUME_URL_KEY)?;
    if storage.owns_url(&url) {
        Some("/api/resume".to_string())
    } else {
        Some(url)
    }
}

impl SiteContent {
    pub fn build(settings: &Settings, storage: &dyn ObjectStore) -> Self {
        Self {
            social: SocialLinks::from_settings(settings),
            hero: HeroContent::from_settings(settings),
            about: AboutContent::from_settings(settings),
            profile_image_url: setting(settings, PROFILE_IMAGE_URL_KEY)
                .map(|_| "/api/profile-image".to_string()),
            resume_download_href: resume_download_href(settings, storage),
        }
    }
}

/// GET /api/site
pub async fn site_content(State(state): State<AppState>) -> Result<Json<SiteContent>, ApiError> {
    let settings = state.settings.all().await?;
    Ok(Json(SiteContent::build(&settings, state.storage.as_ref())))
}

/// GET /api/admin/settings - Raw key/value pairs
pub async fn get_settings(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Settings>, ApiError> {
    Ok(Json(state.settings.all().await?))
}

/// PUT /api/admin/settings - Upsert every pair in the body
pub async fn save_settings(
    _admin: AdminUser,
    State(state): State<AppState>,
    ApiJson(values): ApiJson<Settings>,
) -> Result<Json<Settings>, ApiError> {
    for (key, value) in &values {
        if !SETTING_KEY_REGEX.is_match(key) {
            return Err(ApiError::validation(format!("Invalid setting key: {}", key)));
        }
        if value.chars().count() > MAX_VALUE_CHARS {
            return Err(ApiError::validation(format!(
                "Setting {} must be {} characters or less",
                key, MAX_VALUE_CHARS
            )));
        }
    }

    for (key, value) in &values {
        state.settings.upsert(key, value.trim()).await?;
    }
    tracing::info!(count = values.len(), "site settings saved");

    Ok(Json(state.settings.all().await?))
}
