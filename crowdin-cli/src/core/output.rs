use anyhow::Result;

use crate::core::types::{
    ApprovalSwitch, LanguageProgress, OutcomeStatus, ReplaceMatch, ReplaceReport,
};
use crate::engine::{BatchObserver, RevokeSummary};
use crate::OutputFormat;

/// Console output for script-style runs. The engines never print; all
/// presentation goes through here.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: &OutputFormat) -> Self {
        Self {
            format: format.clone(),
        }
    }

    pub fn write_matches(&self, matches: &[ReplaceMatch]) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(matches)?);
            }
            OutputFormat::Text => {
                if matches.is_empty() {
                    println!("No matches found.");
                    return Ok(());
                }
                println!(
                    "Found {} matching translation{}\n",
                    matches.len(),
                    if matches.len() == 1 { "" } else { "s" }
                );
                for item in matches {
                    println!("--- String ID: {} ---", item.string_id);
                    println!("  BEFORE: {}", item.original);
                    println!("  AFTER:  {}", item.updated);
                    println!();
                }
                println!("💡 Run with --apply to commit these replacements");
            }
        }
        Ok(())
    }

    pub fn write_report(&self, report: &ReplaceReport) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(report)?);
            }
            OutputFormat::Text => {
                println!("✓ Replacement complete!");
                println!("  Updated: {}", report.updated);
                println!("  Failed:  {}", report.failed);
                for outcome in &report.outcomes {
                    if let OutcomeStatus::Failed(detail) = &outcome.status {
                        println!("  ⚠️  String {}: {}", outcome.string_id, detail);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn write_switch(&self, outcome: &ApprovalSwitch) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(outcome)?);
            }
            OutputFormat::Text => match outcome {
                ApprovalSwitch::AlreadyApproved { translation_id } => {
                    println!("✓ Already approved correctly (translation {translation_id})");
                }
                ApprovalSwitch::Switched {
                    translation_id,
                    approval_id,
                    removed_approval_ids,
                    ..
                } => {
                    if !removed_approval_ids.is_empty() {
                        println!(
                            "Removed {} stale approval{}",
                            removed_approval_ids.len(),
                            if removed_approval_ids.len() == 1 { "" } else { "s" }
                        );
                    }
                    println!(
                        "✓ Approved translation {translation_id} (approval {approval_id})"
                    );
                }
            },
        }
        Ok(())
    }

    pub fn write_revoke(&self, summaries: &[RevokeSummary]) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(summaries)?);
            }
            OutputFormat::Text => {
                for summary in summaries {
                    if summary.dry_run {
                        println!(
                            "{}: {} approvals found (dry run, nothing removed)",
                            summary.language_id, summary.found
                        );
                    } else {
                        println!(
                            "{}: {} removed, {} errors (of {} found)",
                            summary.language_id, summary.removed, summary.errors, summary.found
                        );
                    }
                }
                let total: usize = summaries.iter().map(|s| s.found).sum();
                println!("\nGrand total: {total} approvals");
            }
        }
        Ok(())
    }

    pub fn write_progress(&self, progress: &[LanguageProgress]) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(progress)?);
            }
            OutputFormat::Text => {
                println!("Translation progress:");
                for language in progress {
                    println!(
                        "  {}: {}% translated, {}% approved",
                        language.language_id,
                        language.translation_progress,
                        language.approval_progress
                    );
                }
            }
        }
        Ok(())
    }
}

/// Observer that narrates batch runs to the console, the way the
/// maintenance scripts reported progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl BatchObserver for ConsoleReporter {
    fn on_progress(&self, processed: usize, total: usize) {
        if processed % 100 == 0 || processed == total {
            println!("  Progress: {processed}/{total}");
        }
    }

    fn on_replacement(&self, item: &ReplaceMatch, outcome: &OutcomeStatus) {
        match outcome {
            OutcomeStatus::Updated => {
                println!("  ✅ String {}: updated", item.string_id);
            }
            OutcomeStatus::Failed(detail) => {
                println!("  ❌ String {}: {}", item.string_id, detail);
            }
        }
    }
}
