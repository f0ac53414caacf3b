use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use super::{BatchObserver, RATE_LIMIT_COOLDOWN, WRITE_DELAY};
use crate::client::{ApprovalQuery, CrowdinApi};
use crate::core::error::CrowdinError;
use crate::core::types::ApprovalSwitch;

const CANDIDATE_LIMIT: usize = 100;
const APPROVAL_PAGE_LIMIT: usize = 100;

/// Per-language result of a bulk approval revocation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeSummary {
    pub language_id: String,
    pub found: usize,
    pub removed: usize,
    pub errors: usize,
    pub dry_run: bool,
}

/// Approval reconciliation: moving an approval to the translation a
/// caller expects, and bulk revocation sweeps.
pub struct ApprovalEngine<'a> {
    api: &'a dyn CrowdinApi,
    write_delay: Duration,
    cooldown: Duration,
}

impl<'a> ApprovalEngine<'a> {
    pub fn new(api: &'a dyn CrowdinApi) -> Self {
        Self {
            api,
            write_delay: WRITE_DELAY,
            cooldown: RATE_LIMIT_COOLDOWN,
        }
    }

    pub fn with_timing(api: &'a dyn CrowdinApi, write_delay: Duration, cooldown: Duration) -> Self {
        Self {
            api,
            write_delay,
            cooldown,
        }
    }

    /// Ensure the approval for a string points at the translation whose
    /// text equals `expected_new_text` exactly.
    ///
    /// No candidate with that text is a typed [`CrowdinError::NotFound`],
    /// never a guess. When the existing approval already points at the
    /// matching candidate this is a read-only no-op. Otherwise every
    /// existing approval is removed before the candidate is approved, so
    /// transient duplicate approvals collapse to one.
    ///
    /// `expected_old_text` only identifies the stale candidate for the
    /// report; it never gates the switch.
    pub async fn switch_approval(
        &self,
        project_id: u64,
        language_id: &str,
        string_id: u64,
        expected_old_text: Option<&str>,
        expected_new_text: &str,
    ) -> Result<ApprovalSwitch, CrowdinError> {
        let candidates = self
            .api
            .list_string_translations(project_id, string_id, language_id, CANDIDATE_LIMIT)
            .await?;

        let target = candidates
            .iter()
            .find(|t| t.text.as_deref() == Some(expected_new_text))
            .ok_or_else(|| {
                CrowdinError::NotFound(format!(
                    "no translation of string {string_id} in {language_id} matches the expected text"
                ))
            })?;

        let stale_translation_id = expected_old_text.and_then(|old| {
            candidates
                .iter()
                .find(|t| t.text.as_deref() == Some(old))
                .map(|t| t.id)
        });

        let approvals = self
            .api
            .list_approvals(
                project_id,
                &ApprovalQuery {
                    string_id: Some(string_id),
                    language_id: Some(language_id.to_string()),
                    limit: APPROVAL_PAGE_LIMIT,
                    ..ApprovalQuery::default()
                },
            )
            .await?;

        if approvals.len() == 1 && approvals[0].translation_id == target.id {
            info!(string_id, translation_id = target.id, "approval already correct");
            return Ok(ApprovalSwitch::AlreadyApproved {
                translation_id: target.id,
            });
        }

        let mut removed_approval_ids = Vec::new();
        for (index, stale) in approvals.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.write_delay).await;
            }
            self.api.remove_approval(project_id, stale.id).await?;
            removed_approval_ids.push(stale.id);
        }

        let approval = self.api.add_approval(project_id, target.id).await?;
        info!(
            string_id,
            translation_id = target.id,
            approval_id = approval.id,
            "approval switched"
        );

        Ok(ApprovalSwitch::Switched {
            translation_id: target.id,
            approval_id: approval.id,
            removed_approval_ids,
            stale_translation_id,
        })
    }

    /// Remove every approval for one language across all project files.
    ///
    /// Collection paginates per file; a short page ends that file. In
    /// dry-run mode nothing is deleted and the summary reports what was
    /// found. Deletions run sequentially with the write delay and the
    /// usual cooldown-and-single-retry on a rate-limit signal; other
    /// failures are counted and skipped.
    pub async fn revoke_all(
        &self,
        project_id: u64,
        language_id: &str,
        dry_run: bool,
        observer: &dyn BatchObserver,
    ) -> Result<RevokeSummary, CrowdinError> {
        let files = self.api.list_files(project_id).await?;

        let mut approval_ids = Vec::new();
        for file in &files {
            let mut offset = 0;
            loop {
                let page = self
                    .api
                    .list_approvals(
                        project_id,
                        &ApprovalQuery {
                            file_id: Some(file.id),
                            language_id: Some(language_id.to_string()),
                            limit: APPROVAL_PAGE_LIMIT,
                            offset,
                            ..ApprovalQuery::default()
                        },
                    )
                    .await?;
                let page_len = page.len();
                approval_ids.extend(page.into_iter().map(|a| a.id));
                if page_len < APPROVAL_PAGE_LIMIT {
                    break;
                }
                offset += page_len;
            }
        }

        info!(
            language = language_id,
            found = approval_ids.len(),
            dry_run,
            "approval sweep collected"
        );

        if dry_run {
            return Ok(RevokeSummary {
                language_id: language_id.to_string(),
                found: approval_ids.len(),
                removed: 0,
                errors: 0,
                dry_run,
            });
        }

        let total = approval_ids.len();
        let mut removed = 0;
        let mut errors = 0;
        for (index, approval_id) in approval_ids.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.write_delay).await;
            }
            match self.remove_with_backoff(project_id, *approval_id).await {
                Ok(()) => removed += 1,
                Err(err) => {
                    warn!(approval_id, %err, "failed to remove approval");
                    errors += 1;
                }
            }
            observer.on_progress(index + 1, total);
        }

        Ok(RevokeSummary {
            language_id: language_id.to_string(),
            found: total,
            removed,
            errors,
            dry_run,
        })
    }

    async fn remove_with_backoff(
        &self,
        project_id: u64,
        approval_id: u64,
    ) -> Result<(), CrowdinError> {
        match self.api.remove_approval(project_id, approval_id).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_rate_limit() => {
                warn!(approval_id, "rate limited, cooling down before single retry");
                tokio::time::sleep(self.cooldown).await;
                self.api.remove_approval(project_id, approval_id).await
            }
            Err(err) => Err(err),
        }
    }
}
