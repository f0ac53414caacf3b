use serde::{Deserialize, Serialize};

/// A Crowdin project as returned by the projects list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub identifier: String,
    pub source_language_id: String,
    #[serde(default)]
    pub target_language_ids: Vec<String>,
}

/// A source file within a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(rename = "type", default)]
    pub file_type: Option<String>,
}

/// A source (untranslated) string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceString {
    pub id: u64,
    pub text: String,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub file_id: Option<u64>,
    #[serde(default)]
    pub context: Option<String>,
}

/// A translation candidate for a single source string.
///
/// Multiple candidates may coexist per string+language; Crowdin keeps
/// history rather than mutating in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub id: u64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A translation row from the per-language listing endpoint. Unlike
/// [`Translation`] it carries the source string id alongside the
/// translation id. Plural strings report their text under a content-type
/// object instead of the plain `text` field, hence the Option.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageTranslation {
    pub string_id: u64,
    pub translation_id: u64,
    #[serde(default)]
    pub text: Option<String>,
}

/// An approval marking one translation as the vetted one for its
/// string+language.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    pub id: u64,
    pub translation_id: u64,
    #[serde(default)]
    pub string_id: Option<u64>,
    #[serde(default)]
    pub language_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Per-language translation/approval progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageProgress {
    pub language_id: String,
    pub translation_progress: u32,
    pub approval_progress: u32,
    #[serde(default)]
    pub words: Option<serde_json::Value>,
    #[serde(default)]
    pub phrases: Option<serde_json::Value>,
}

/// One QA check issue reported by Crowdin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaIssue {
    pub string_id: u64,
    pub language_id: String,
    pub category: String,
    #[serde(default)]
    pub validation: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// The bounds of one reconciliation pass: which project, which language,
/// optionally which file, and the page size used while reading.
#[derive(Debug, Clone)]
pub struct ReplaceScope {
    pub project_id: u64,
    pub language_id: String,
    pub file_id: Option<u64>,
    pub page_limit: usize,
}

/// A single planned replacement. Emitted only when the replacement
/// actually changes the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceMatch {
    pub string_id: u64,
    pub translation_id: u64,
    pub original: String,
    pub updated: String,
}

/// Terminal state of one attempted write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status", content = "detail")]
pub enum OutcomeStatus {
    Updated,
    Failed(String),
}

/// Per-match result of an apply run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceOutcome {
    pub string_id: u64,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

/// Complete result of an apply run. Always covers every match; partial
/// application is a reportable terminal state, not an error.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceReport {
    pub outcomes: Vec<ReplaceOutcome>,
    pub updated: usize,
    pub failed: usize,
}

impl ReplaceReport {
    pub fn new() -> Self {
        Self {
            outcomes: Vec::new(),
            updated: 0,
            failed: 0,
        }
    }

    pub fn record(&mut self, string_id: u64, status: OutcomeStatus) {
        match status {
            OutcomeStatus::Updated => self.updated += 1,
            OutcomeStatus::Failed(_) => self.failed += 1,
        }
        self.outcomes.push(ReplaceOutcome { string_id, status });
    }
}

impl Default for ReplaceReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of reconciling the approval state of one string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "result")]
pub enum ApprovalSwitch {
    /// The existing approval already points at the expected translation.
    AlreadyApproved { translation_id: u64 },
    /// Stale approvals were removed and the expected translation approved.
    Switched {
        translation_id: u64,
        approval_id: u64,
        removed_approval_ids: Vec<u64>,
        stale_translation_id: Option<u64>,
    },
}
