use anyhow::Result;

use crate::client::CrowdinApi;
use crate::core::output::{ConsoleReporter, OutputWriter};
use crate::engine::{ApprovalEngine, NullObserver, RevokeSummary};
use crate::OutputFormat;

pub async fn run(
    api: &dyn CrowdinApi,
    project_id: u64,
    languages: Vec<String>,
    dry_run: bool,
    format: &OutputFormat,
) -> Result<()> {
    let engine = ApprovalEngine::new(api);
    let mut summaries: Vec<RevokeSummary> = Vec::new();

    for language_id in &languages {
        let summary = match format {
            OutputFormat::Text => {
                println!("Revoking approvals for language: {language_id}");
                engine
                    .revoke_all(project_id, language_id, dry_run, &ConsoleReporter)
                    .await?
            }
            OutputFormat::Json => {
                engine
                    .revoke_all(project_id, language_id, dry_run, &NullObserver)
                    .await?
            }
        };
        summaries.push(summary);
    }

    OutputWriter::new(format).write_revoke(&summaries)?;
    Ok(())
}
