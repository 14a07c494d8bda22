//! Database Models - structs representing database tables (used by sqlx/serde).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Interface language. English is the fallback for every bilingual field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Om,
}

impl Language {
    /// The Afaan Oromo value when asked for and non-blank, the English one otherwise.
    pub fn pick<'a>(self, en: &'a str, om: Option<&'a str>) -> &'a str {
        match (self, om) {
            (Language::Om, Some(om)) if !om.trim().is_empty() => om,
            _ => en,
        }
    }
}

/// Project model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub title_en: String,
    pub title_om: Option<String>,
    pub description_en: String,
    pub description_om: Option<String>,
    pub technologies: Vec<String>,
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub image_url: Option<String>,
    pub featured: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

/// Editable project fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectDraft {
    pub title_en: String,
    pub title_om: Option<String>,
    pub description_en: String,
    pub description_om: Option<String>,
    pub technologies: Vec<String>,
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub image_url: Option<String>,
    pub featured: bool,
    pub display_order: i32,
}

/// Blog post model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: Uuid,
    pub slug: String,
    pub title_en: String,
    pub title_om: Option<String>,
    pub excerpt_en: Option<String>,
    pub excerpt_om: Option<String>,
    pub content_en: String,
    pub content_om: Option<String>,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    pub published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogPost {
    pub fn title(&self, lang: Language) -> &str {
        lang.pick(&self.title_en, self.title_om.as_deref())
    }

    pub fn excerpt(&self, lang: Language) -> Option<&str> {
        match (lang, self.excerpt_om.as_deref()) {
            (Language::Om, Some(om)) if !om.trim().is_empty() => Some(om),
            _ => self.excerpt_en.as_deref(),
        }
    }

    pub fn content(&self, lang: Language) -> &str {
        lang.pick(&self.content_en, self.content_om.as_deref())
    }
}

/// Editable blog post fields. `published_at` is derived by the publish rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlogPostDraft {
    pub slug: String,
    pub title_en: String,
    pub title_om: Option<String>,
    pub excerpt_en: Option<String>,
    pub excerpt_om: Option<String>,
    pub content_en: String,
    pub content_om: Option<String>,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    pub published: bool,
    #[serde(skip)]
    pub published_at: Option<DateTime<Utc>>,
}

/// Certificate model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: Uuid,
    pub title_en: String,
    pub title_om: Option<String>,
    pub issuer: Option<String>,
    pub credential_url: String,
    pub image_url: Option<String>,
    pub issued_at: Option<NaiveDate>,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificateDraft {
    pub title_en: String,
    pub title_om: Option<String>,
    pub issuer: Option<String>,
    pub credential_url: String,
    pub image_url: Option<String>,
    pub issued_at: Option<NaiveDate>,
    pub display_order: i32,
}

/// Skill model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: Uuid,
    pub category: String,
    pub name: String,
    pub level: i32,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillDraft {
    pub category: String,
    pub name: String,
    pub level: i32,
    pub display_order: i32,
}

/// Contact message model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// New contact message for insertion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContactMessage {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
}

impl From<crate::validation::ValidContact> for NewContactMessage {
    fn from(c: crate::validation::ValidContact) -> Self {
        Self {
            name: c.name,
            email: c.email,
            subject: c.subject,
            message: c.message,
        }
    }
}

/// User model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Free-form metadata; older admin accounts carry `is_admin` here.
    pub user_metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn legacy_admin_flag(&self) -> Option<bool> {
        self.user_metadata.get("is_admin").and_then(|v| v.as_bool())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_pick_falls_back_to_english() {
        assert_eq!(Language::Om.pick("Hello", Some("Akkam")), "Akkam");
        assert_eq!(Language::Om.pick("Hello", Some("  ")), "Hello");
        assert_eq!(Language::Om.pick("Hello", None), "Hello");
        assert_eq!(Language::En.pick("Hello", Some("Akkam")), "Hello");
    }

    #[test]
    fn test_language_deserializes_lowercase() {
        let lang: Language = serde_json::from_str("\"om\"").unwrap();
        assert_eq!(lang, Language::Om);
    }

    #[test]
    fn test_legacy_admin_flag() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@b.co".to_string(),
            password_hash: String::new(),
            user_metadata: serde_json::json!({ "is_admin": true }),
            created_at: Utc::now(),
        };
        assert_eq!(user.legacy_admin_flag(), Some(true));

        let plain = User {
            user_metadata: serde_json::json!({}),
            ..user
        };
        assert_eq!(plain.legacy_admin_flag(), None);
    }
}
