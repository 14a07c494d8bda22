//! Field rules for the contact form and the sign-up form.
//!
//! Rules run in field order and stop at the first violation; that message is
//! what the client shows.

use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

pub const NAME_MAX: usize = 100;
pub const EMAIL_MAX: usize = 254;
pub const SUBJECT_MAX: usize = 200;
pub const MESSAGE_MAX: usize = 5000;
pub const PASSWORD_MIN: usize = 8;

/// Raw contact form body. Missing fields deserialize as empty strings so they
/// fail with the field's own message.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContactPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// A contact submission that passed every rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidContact {
    pub name: String,
    pub email: String,
    /// `None` when omitted or empty.
    pub subject: Option<String>,
    pub message: String,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

pub fn validate_contact(payload: ContactPayload) -> Result<ValidContact, String> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err("Name is required".to_string());
    }
    if char_len(&name) > NAME_MAX {
        return Err("Name must be 100 characters or less".to_string());
    }

    if !payload.email.validate_email() {
        return Err("Invalid email address".to_string());
    }
    if char_len(&payload.email) > EMAIL_MAX {
        return Err("Email must be 254 characters or less".to_string());
    }

    let subject = payload.subject.filter(|s| !s.is_empty());
    if let Some(subject) = &subject {
        if char_len(subject) > SUBJECT_MAX {
            return Err("Subject must be 200 characters or less".to_string());
        }
    }

    if payload.message.is_empty() {
        return Err("Message is required".to_string());
    }
    if char_len(&payload.message) > MESSAGE_MAX {
        return Err("Message must be 5000 characters or less".to_string());
    }

    Ok(ValidContact {
        name,
        email: payload.email,
        subject,
        message: payload.message,
    })
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpPayload {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub repeat_password: String,
}

pub fn validate_sign_up(payload: &SignUpPayload) -> Result<(), String> {
    if !payload.email.validate_email() {
        return Err("Invalid email address".to_string());
    }
    if char_len(&payload.password) < PASSWORD_MIN {
        return Err("Password must be at least 8 characters".to_string());
    }
    let has_lower = payload.password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = payload.password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = payload.password.chars().any(|c| c.is_ascii_digit());
    if !(has_lower && has_upper && has_digit) {
        return Err("Password must include uppercase, lowercase, and a number".to_string());
    }
    if payload.password != payload.repeat_password {
        return Err("Passwords do not match".to_string());
    }
    Ok(())
}
