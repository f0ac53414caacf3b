use std::time::Duration;

use tracing::{debug, info, warn};

use super::{BatchObserver, RATE_LIMIT_COOLDOWN, WRITE_DELAY};
use crate::client::{CrowdinApi, TranslationQuery};
use crate::core::error::CrowdinError;
use crate::core::types::{OutcomeStatus, ReplaceMatch, ReplaceReport, ReplaceScope};

/// Bulk text reconciliation over a project's translations.
///
/// `plan` is a pure read: it finds every translation in scope whose text
/// contains the search term and computes the replaced text. `apply` runs
/// the plan and writes each replacement back as a new translation
/// candidate — Crowdin keeps history, so a write never edits an existing
/// translation object, and approval state is untouched (see
/// [`super::ApprovalEngine`] for that).
pub struct ReplaceEngine<'a> {
    api: &'a dyn CrowdinApi,
    write_delay: Duration,
    cooldown: Duration,
}

impl<'a> ReplaceEngine<'a> {
    pub fn new(api: &'a dyn CrowdinApi) -> Self {
        Self {
            api,
            write_delay: WRITE_DELAY,
            cooldown: RATE_LIMIT_COOLDOWN,
        }
    }

    /// Override the quota timings. Tests run with zero delays.
    pub fn with_timing(api: &'a dyn CrowdinApi, write_delay: Duration, cooldown: Duration) -> Self {
        Self {
            api,
            write_delay,
            cooldown,
        }
    }

    /// Find every translation in scope that the replacement would change.
    ///
    /// Replacement is a literal, case-sensitive, non-overlapping global
    /// substitution. A match is emitted only when the updated text
    /// differs from the original, in retrieval order. Issues no writes.
    pub async fn plan(
        &self,
        scope: &ReplaceScope,
        search: &str,
        replace: &str,
    ) -> Result<Vec<ReplaceMatch>, CrowdinError> {
        if search.is_empty() {
            return Err(CrowdinError::InvalidArgument(
                "search term must not be empty".to_string(),
            ));
        }
        if scope.page_limit == 0 {
            return Err(CrowdinError::InvalidArgument(
                "page limit must be at least 1".to_string(),
            ));
        }

        let mut matches = Vec::new();
        let mut offset = 0;

        loop {
            let query = TranslationQuery {
                file_id: scope.file_id,
                limit: scope.page_limit,
                offset,
                ..TranslationQuery::default()
            };
            let page = self
                .api
                .list_language_translations(scope.project_id, &scope.language_id, &query)
                .await?;
            let page_len = page.len();
            debug!(offset, page_len, "fetched translation page");

            for row in page {
                let Some(text) = row.text else {
                    continue;
                };
                if !text.contains(search) {
                    continue;
                }
                let updated = text.replace(search, replace);
                if updated != text {
                    matches.push(ReplaceMatch {
                        string_id: row.string_id,
                        translation_id: row.translation_id,
                        original: text,
                        updated,
                    });
                }
            }

            // A short page signals end-of-results.
            if page_len < scope.page_limit {
                break;
            }
            offset += page_len;
        }

        info!(
            matches = matches.len(),
            language = %scope.language_id,
            "replacement plan complete"
        );
        Ok(matches)
    }

    /// Plan, then commit each replacement as a new translation candidate.
    ///
    /// Writes run sequentially with a fixed delay. Each match is attempted
    /// independently: a failure is recorded in its outcome and never
    /// aborts the rest of the batch. There is no rollback — partial
    /// application is an expected terminal state.
    pub async fn apply(
        &self,
        scope: &ReplaceScope,
        search: &str,
        replace: &str,
        observer: &dyn BatchObserver,
    ) -> Result<ReplaceReport, CrowdinError> {
        let matches = self.plan(scope, search, replace).await?;
        let total = matches.len();
        let mut report = ReplaceReport::new();

        for (index, item) in matches.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.write_delay).await;
            }

            let status = match self.write_once_with_backoff(scope, item).await {
                Ok(()) => OutcomeStatus::Updated,
                Err(err) => OutcomeStatus::Failed(err.to_string()),
            };

            observer.on_replacement(item, &status);
            observer.on_progress(index + 1, total);
            report.record(item.string_id, status);
        }

        info!(
            updated = report.updated,
            failed = report.failed,
            "replacement apply complete"
        );
        Ok(report)
    }

    /// One write attempt, with a single cooldown-and-retry on a
    /// rate-limit signal. All other failures are terminal for the item.
    async fn write_once_with_backoff(
        &self,
        scope: &ReplaceScope,
        item: &ReplaceMatch,
    ) -> Result<(), CrowdinError> {
        let write = || {
            self.api.add_translation(
                scope.project_id,
                item.string_id,
                &scope.language_id,
                &item.updated,
            )
        };

        match write().await {
            Ok(_) => Ok(()),
            Err(err) if err.is_rate_limit() => {
                warn!(
                    string_id = item.string_id,
                    "rate limited, cooling down before single retry"
                );
                tokio::time::sleep(self.cooldown).await;
                write().await.map(|_| ())
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::FakeApi;
    use crate::engine::NullObserver;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::Ordering;

    fn scope() -> ReplaceScope {
        ReplaceScope {
            project_id: 378229,
            language_id: "en".to_string(),
            file_id: None,
            page_limit: 100,
        }
    }

    fn engine(api: &FakeApi) -> ReplaceEngine<'_> {
        ReplaceEngine::with_timing(api, Duration::ZERO, Duration::ZERO)
    }

    #[tokio::test]
    async fn empty_search_is_rejected_before_any_remote_call() {
        let api = FakeApi::with_translations(vec![(1, 10, "whatever")]);

        let err = engine(&api).plan(&scope(), "", "x").await.unwrap_err();

        assert!(matches!(err, CrowdinError::InvalidArgument(_)));
        assert_eq!(api.read_calls.load(Ordering::SeqCst), 0);
        assert_eq!(api.write_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn plan_replaces_case_sensitively() {
        let api = FakeApi::with_translations(vec![
            (50402, 91, "Visit DraftBot at draftbot.com"),
            (50404, 92, "No brand name here"),
        ]);

        let matches = engine(&api)
            .plan(&scope(), "DraftBot", "Crownicles")
            .await
            .unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].string_id, 50402);
        assert_eq!(matches[0].updated, "Visit Crownicles at draftbot.com");
    }

    #[tokio::test]
    async fn plan_handles_possessive_contraction() {
        let api = FakeApi::with_translations(vec![(53372, 93, "Crownicles's code")]);

        let matches = engine(&api)
            .plan(&scope(), "Crownicles's", "Crownicles'")
            .await
            .unwrap();

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].updated, "Crownicles' code");
    }

    #[tokio::test]
    async fn plan_skips_identity_replacements() {
        let api = FakeApi::with_translations(vec![(1, 10, "DraftBot rules")]);

        let matches = engine(&api)
            .plan(&scope(), "DraftBot", "DraftBot")
            .await
            .unwrap();

        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn plan_issues_no_writes() {
        let api = FakeApi::with_translations(vec![(1, 10, "DraftBot"), (2, 11, "DraftBot too")]);

        engine(&api)
            .plan(&scope(), "DraftBot", "Crownicles")
            .await
            .unwrap();

        assert_eq!(api.write_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn plan_is_deterministic_against_fixed_snapshot() {
        let api = FakeApi::with_translations(vec![
            (1, 10, "DraftBot one"),
            (2, 11, "DraftBot two"),
            (3, 12, "untouched"),
        ]);
        let engine = engine(&api);

        let first = engine.plan(&scope(), "DraftBot", "Crownicles").await.unwrap();
        let second = engine.plan(&scope(), "DraftBot", "Crownicles").await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn plan_paginates_until_short_page() {
        let api = FakeApi::with_translations(vec![
            (1, 10, "DraftBot a"),
            (2, 11, "plain"),
            (3, 12, "DraftBot b"),
            (4, 13, "plain"),
            (5, 14, "DraftBot c"),
        ]);
        let mut scope = scope();
        scope.page_limit = 2;

        let matches = engine(&api)
            .plan(&scope, "DraftBot", "Crownicles")
            .await
            .unwrap();

        // Two full pages and one short page.
        assert_eq!(api.read_calls.load(Ordering::SeqCst), 3);
        let ids: Vec<u64> = matches.iter().map(|m| m.string_id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[tokio::test]
    async fn replacement_is_idempotent_on_updated_text() {
        let api = FakeApi::with_translations(vec![(1, 10, "Visit DraftBot")]);
        let matches = engine(&api)
            .plan(&scope(), "DraftBot", "Crownicles")
            .await
            .unwrap();

        // A second pass over the already-updated snapshot finds nothing.
        let updated = FakeApi::with_translations(vec![(1, 20, matches[0].updated.as_str())]);
        let again = engine(&updated)
            .plan(&scope(), "DraftBot", "Crownicles")
            .await
            .unwrap();

        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn apply_writes_every_match_as_new_candidate() {
        let api = FakeApi::with_translations(vec![
            (1, 10, "DraftBot one"),
            (2, 11, "DraftBot two"),
        ]);

        let report = engine(&api)
            .apply(&scope(), "DraftBot", "Crownicles", &NullObserver)
            .await
            .unwrap();

        assert_eq!(report.updated, 2);
        assert_eq!(report.failed, 0);
        let writes = api.recorded_writes();
        assert_eq!(
            writes,
            vec![
                (1, "en".to_string(), "Crownicles one".to_string()),
                (2, "en".to_string(), "Crownicles two".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn apply_isolates_per_item_failures() {
        let mut api = FakeApi::with_translations(vec![
            (1, 10, "DraftBot one"),
            (2, 11, "DraftBot two"),
            (3, 12, "DraftBot three"),
        ]);
        api.fail_writes_for.insert(2);

        let report = engine(&api)
            .apply(&scope(), "DraftBot", "Crownicles", &NullObserver)
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.updated, 2);
        assert_eq!(report.failed, 1);
        assert!(matches!(
            report.outcomes[1].status,
            OutcomeStatus::Failed(_)
        ));
    }

    #[tokio::test]
    async fn rate_limit_triggers_exactly_one_retry() {
        let api = FakeApi::with_translations(vec![(1, 10, "DraftBot")]);
        api.rate_limit_writes.lock().unwrap().insert(1, 1);

        let report = engine(&api)
            .apply(&scope(), "DraftBot", "Crownicles", &NullObserver)
            .await
            .unwrap();

        assert_eq!(report.updated, 1);
        // First attempt rate limited, retry succeeded.
        assert_eq!(api.write_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn second_rate_limit_counts_as_item_error() {
        let api = FakeApi::with_translations(vec![(1, 10, "DraftBot")]);
        api.rate_limit_writes.lock().unwrap().insert(1, 2);

        let report = engine(&api)
            .apply(&scope(), "DraftBot", "Crownicles", &NullObserver)
            .await
            .unwrap();

        assert_eq!(report.failed, 1);
        // No second retry after the cooldown attempt also fails.
        assert_eq!(api.write_calls.load(Ordering::SeqCst), 2);
    }
}
