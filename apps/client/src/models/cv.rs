use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeywordMatch {
    pub keyword: String,
    pub found: bool,
    #[serde(default)]
    pub importance: Importance,
    #[serde(default)]
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CvSection {
    pub name: String,
    pub score: u32,
    pub feedback: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Full ATS analysis, returned to signed-in callers and saved to history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CvAnalysisResult {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub overall_score: u32,
    pub ats_compatibility: u32,
    #[serde(default)]
    pub keyword_matches: Vec<KeywordMatch>,
    #[serde(default)]
    pub missing_keywords: Vec<String>,
    #[serde(default)]
    pub sections: Vec<CvSection>,
    pub summary: String,
    #[serde(default)]
    pub improvement_tips: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Reduced analysis for anonymous callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CvAnalysisPreview {
    pub overall_score: u32,
    #[serde(default)]
    pub preview_keywords: Vec<KeywordMatch>,
    pub summary_preview: String,
    #[serde(default)]
    pub upgrade_message: String,
}

/// Either shape of `/cv/analyze`.
///
/// An explicit `kind` tag decides the variant when the backend sends one.
/// Untagged bodies fall back to the presence of a non-empty `id`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CvAnalysis {
    Full(CvAnalysisResult),
    Preview(CvAnalysisPreview),
}

impl<'de> Deserialize<'de> for CvAnalysis {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut value = Value::deserialize(deserializer)?;
        let tag = value
            .as_object_mut()
            .and_then(|obj| obj.remove("kind"))
            .and_then(|k| k.as_str().map(str::to_owned));

        let is_full = match tag.as_deref() {
            Some("full") => true,
            Some("preview") => false,
            Some(other) => {
                return Err(de::Error::unknown_variant(other, &["full", "preview"]));
            }
            None => value
                .get("id")
                .and_then(Value::as_str)
                .is_some_and(|id| !id.is_empty()),
        };

        if is_full {
            serde_json::from_value(value)
                .map(CvAnalysis::Full)
                .map_err(de::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(CvAnalysis::Preview)
                .map_err(de::Error::custom)
        }
    }
}

impl CvAnalysis {
    /// Id of the saved analysis; previews are never saved.
    pub fn analysis_id(&self) -> Option<&str> {
        match self {
            CvAnalysis::Full(r) => Some(r.id.as_str()),
            CvAnalysis::Preview(_) => None,
        }
    }

    pub fn overall_score(&self) -> u32 {
        match self {
            CvAnalysis::Full(r) => r.overall_score,
            CvAnalysis::Preview(p) => p.overall_score,
        }
    }

    /// Previews carry no separate ATS figure; the overall score stands in.
    pub fn ats_compatibility(&self) -> u32 {
        match self {
            CvAnalysis::Full(r) => r.ats_compatibility,
            CvAnalysis::Preview(p) => p.overall_score,
        }
    }

    pub fn keywords(&self) -> &[KeywordMatch] {
        match self {
            CvAnalysis::Full(r) => &r.keyword_matches,
            CvAnalysis::Preview(p) => &p.preview_keywords,
        }
    }

    pub fn summary(&self) -> &str {
        match self {
            CvAnalysis::Full(r) => &r.summary,
            CvAnalysis::Preview(p) => &p.summary_preview,
        }
    }

    pub fn as_full(&self) -> Option<&CvAnalysisResult> {
        match self {
            CvAnalysis::Full(r) => Some(r),
            CvAnalysis::Preview(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OptimizedCvSection {
    pub title: String,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub bullets: Vec<String>,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OptimizedCv {
    pub contact_name: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_location: Option<String>,
    pub contact_linkedin: Option<String>,
    pub summary: String,
    pub experience: Vec<OptimizedCvSection>,
    pub education: Vec<OptimizedCvSection>,
    pub skills: Vec<String>,
    pub certifications: Vec<String>,
    pub estimated_score: u32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ExportTemplate {
    #[default]
    Classic,
    Minimalist,
    Executive,
}

/// Body of `POST /cv/export`: the optimized CV flattened next to its template.
#[derive(Debug, Serialize)]
pub struct ExportRequest<'a> {
    #[serde(flatten)]
    pub cv: &'a OptimizedCv,
    pub template: ExportTemplate,
}
