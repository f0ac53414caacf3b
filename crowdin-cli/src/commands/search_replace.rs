use anyhow::Result;

use crate::client::CrowdinApi;
use crate::core::output::{ConsoleReporter, OutputWriter};
use crate::core::types::ReplaceScope;
use crate::engine::{NullObserver, ReplaceEngine};
use crate::OutputFormat;

#[allow(clippy::too_many_arguments)]
pub async fn run(
    api: &dyn CrowdinApi,
    project_id: u64,
    language_id: String,
    search: String,
    replace: String,
    file_id: Option<u64>,
    apply: bool,
    limit: usize,
    format: &OutputFormat,
) -> Result<()> {
    let scope = ReplaceScope {
        project_id,
        language_id,
        file_id,
        page_limit: limit,
    };
    let engine = ReplaceEngine::new(api);
    let writer = OutputWriter::new(format);

    if apply {
        // Per-item narration only makes sense for text output.
        let report = match format {
            OutputFormat::Text => {
                engine
                    .apply(&scope, &search, &replace, &ConsoleReporter)
                    .await?
            }
            OutputFormat::Json => engine.apply(&scope, &search, &replace, &NullObserver).await?,
        };
        writer.write_report(&report)?;
    } else {
        let matches = engine.plan(&scope, &search, &replace).await?;
        writer.write_matches(&matches)?;
    }

    Ok(())
}
