//! In-memory fake of the Crowdin API for engine tests. Records every
//! call and can inject per-item failures and rate-limit signals.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{ApprovalQuery, CrowdinApi, StringQuery, TranslationQuery};
use crate::core::error::CrowdinError;
use crate::core::types::{
    Approval, LanguageProgress, LanguageTranslation, Project, ProjectFile, QaIssue, SourceString,
    Translation,
};

pub struct FakeApi {
    /// Snapshot served by the per-language translation listing.
    pub translations: Vec<LanguageTranslation>,
    /// Candidates served by the per-string translation listing.
    pub string_translations: HashMap<u64, Vec<Translation>>,
    /// Approvals, keyed by string id (for switch) and file id (for revoke).
    pub approvals_by_string: HashMap<u64, Vec<Approval>>,
    pub approvals_by_file: HashMap<u64, Vec<Approval>>,
    pub files: Vec<ProjectFile>,

    /// String ids whose writes fail with a remote error.
    pub fail_writes_for: HashSet<u64>,
    /// String id -> number of rate-limit responses before a write succeeds.
    pub rate_limit_writes: Mutex<HashMap<u64, usize>>,
    /// Approval ids whose removal fails with a remote error.
    pub fail_removals_for: HashSet<u64>,

    pub read_calls: AtomicUsize,
    pub write_calls: AtomicUsize,
    pub writes: Mutex<Vec<(u64, String, String)>>,
    pub removed_approvals: Mutex<Vec<u64>>,
    pub added_approvals: Mutex<Vec<u64>>,
    next_id: AtomicU64,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            translations: Vec::new(),
            string_translations: HashMap::new(),
            approvals_by_string: HashMap::new(),
            approvals_by_file: HashMap::new(),
            files: Vec::new(),
            fail_writes_for: HashSet::new(),
            rate_limit_writes: Mutex::new(HashMap::new()),
            fail_removals_for: HashSet::new(),
            read_calls: AtomicUsize::new(0),
            write_calls: AtomicUsize::new(0),
            writes: Mutex::new(Vec::new()),
            removed_approvals: Mutex::new(Vec::new()),
            added_approvals: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1000),
        }
    }
}

impl FakeApi {
    pub fn with_translations(rows: Vec<(u64, u64, &str)>) -> Self {
        Self {
            translations: rows
                .into_iter()
                .map(|(string_id, translation_id, text)| LanguageTranslation {
                    string_id,
                    translation_id,
                    text: Some(text.to_string()),
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn recorded_writes(&self) -> Vec<(u64, String, String)> {
        self.writes.lock().unwrap().clone()
    }

    fn fresh_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

pub fn translation(id: u64, text: &str) -> Translation {
    Translation {
        id,
        text: Some(text.to_string()),
        rating: None,
        created_at: None,
    }
}

pub fn approval(id: u64, translation_id: u64) -> Approval {
    Approval {
        id,
        translation_id,
        string_id: None,
        language_id: None,
        created_at: None,
    }
}

#[async_trait]
impl CrowdinApi for FakeApi {
    async fn list_projects(&self) -> Result<Vec<Project>, CrowdinError> {
        unreachable!("not exercised by engine tests")
    }

    async fn get_project(&self, _project_id: u64) -> Result<serde_json::Value, CrowdinError> {
        unreachable!("not exercised by engine tests")
    }

    async fn list_files(&self, _project_id: u64) -> Result<Vec<ProjectFile>, CrowdinError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.files.clone())
    }

    async fn project_progress(
        &self,
        _project_id: u64,
    ) -> Result<Vec<LanguageProgress>, CrowdinError> {
        unreachable!("not exercised by engine tests")
    }

    async fn list_strings(
        &self,
        _project_id: u64,
        _query: &StringQuery,
    ) -> Result<Vec<SourceString>, CrowdinError> {
        unreachable!("not exercised by engine tests")
    }

    async fn get_string(
        &self,
        _project_id: u64,
        _string_id: u64,
    ) -> Result<SourceString, CrowdinError> {
        unreachable!("not exercised by engine tests")
    }

    async fn list_language_translations(
        &self,
        _project_id: u64,
        _language_id: &str,
        query: &TranslationQuery,
    ) -> Result<Vec<LanguageTranslation>, CrowdinError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        let page = self
            .translations
            .iter()
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect();
        Ok(page)
    }

    async fn list_string_translations(
        &self,
        _project_id: u64,
        string_id: u64,
        _language_id: &str,
        _limit: usize,
    ) -> Result<Vec<Translation>, CrowdinError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .string_translations
            .get(&string_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_translation(
        &self,
        _project_id: u64,
        string_id: u64,
        language_id: &str,
        text: &str,
    ) -> Result<Translation, CrowdinError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);

        let mut limits = self.rate_limit_writes.lock().unwrap();
        if let Some(remaining) = limits.get_mut(&string_id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(CrowdinError::RateLimited);
            }
        }
        drop(limits);

        if self.fail_writes_for.contains(&string_id) {
            return Err(CrowdinError::Remote {
                status: 403,
                message: "permission denied".to_string(),
            });
        }

        self.writes
            .lock()
            .unwrap()
            .push((string_id, language_id.to_string(), text.to_string()));
        Ok(translation(self.fresh_id(), text))
    }

    async fn delete_translation(
        &self,
        _project_id: u64,
        _translation_id: u64,
    ) -> Result<(), CrowdinError> {
        unreachable!("not exercised by engine tests")
    }

    async fn delete_all_translations(
        &self,
        _project_id: u64,
        _string_id: u64,
        _language_id: Option<&str>,
    ) -> Result<(), CrowdinError> {
        unreachable!("not exercised by engine tests")
    }

    async fn list_approvals(
        &self,
        _project_id: u64,
        query: &ApprovalQuery,
    ) -> Result<Vec<Approval>, CrowdinError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        let pool = if let Some(string_id) = query.string_id {
            self.approvals_by_string
                .get(&string_id)
                .cloned()
                .unwrap_or_default()
        } else if let Some(file_id) = query.file_id {
            self.approvals_by_file
                .get(&file_id)
                .cloned()
                .unwrap_or_default()
        } else {
            Vec::new()
        };
        Ok(pool
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn add_approval(
        &self,
        _project_id: u64,
        translation_id: u64,
    ) -> Result<Approval, CrowdinError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.added_approvals.lock().unwrap().push(translation_id);
        Ok(approval(self.fresh_id(), translation_id))
    }

    async fn remove_approval(
        &self,
        _project_id: u64,
        approval_id: u64,
    ) -> Result<(), CrowdinError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_removals_for.contains(&approval_id) {
            return Err(CrowdinError::Remote {
                status: 500,
                message: "internal error".to_string(),
            });
        }
        self.removed_approvals.lock().unwrap().push(approval_id);
        Ok(())
    }

    async fn list_qa_issues(
        &self,
        _project_id: u64,
        _language_id: Option<&str>,
        _limit: usize,
    ) -> Result<Vec<QaIssue>, CrowdinError> {
        unreachable!("not exercised by engine tests")
    }
}
