use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Classic,
    Startup,
    Corporate,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CoverLetterRequest {
    pub job_title: String,
    pub company_name: String,
    pub job_description: String,
    pub tone: Tone,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoverLetterResponse {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub job_title: String,
    pub company_name: String,
    pub tone: Tone,
    pub content: String,
    pub word_count: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoverLetterListItem {
    pub id: String,
    pub job_title: String,
    pub company_name: String,
    pub tone: Tone,
    pub word_count: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&CoverLetterResponse> for CoverLetterListItem {
    fn from(letter: &CoverLetterResponse) -> Self {
        CoverLetterListItem {
            id: letter.id.clone(),
            job_title: letter.job_title.clone(),
            company_name: letter.company_name.clone(),
            tone: letter.tone,
            word_count: letter.word_count,
            created_at: letter.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverLetterUpdate {
    pub content: String,
}
