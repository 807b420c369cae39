use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-tier grant a brand-new account starts with.
pub const DEFAULT_FREE_USES: u32 = 3;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    #[default]
    Free,
    Premium,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub plan: Plan,
    #[serde(default = "default_free_uses")]
    pub free_uses_remaining: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_free_uses() -> u32 {
    DEFAULT_FREE_USES
}

/// Body of `PATCH /users/me`. Unset fields are left untouched server-side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent_marketing: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CompletenessStatus {
    pub has_cv: bool,
    pub has_photo: bool,
    pub has_letter: bool,
    pub has_application: bool,
}

impl CompletenessStatus {
    /// Number of completed profile areas out of four.
    pub fn completed(&self) -> usize {
        [self.has_cv, self.has_photo, self.has_letter, self.has_application]
            .iter()
            .filter(|done| **done)
            .count()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UserStats {
    pub cv_count: u32,
    pub letter_count: u32,
    pub photo_count: u32,
    pub application_count: u32,
    pub latest_cv_score: Option<u32>,
    pub completeness: CompletenessStatus,
}
