use anyhow::Result;

use crate::client::CrowdinApi;
use crate::core::output::OutputWriter;
use crate::engine::ApprovalEngine;
use crate::OutputFormat;

pub async fn run(
    api: &dyn CrowdinApi,
    project_id: u64,
    language_id: String,
    string_id: u64,
    expected_old_text: Option<String>,
    expected_new_text: String,
    format: &OutputFormat,
) -> Result<()> {
    let engine = ApprovalEngine::new(api);
    let outcome = engine
        .switch_approval(
            project_id,
            &language_id,
            string_id,
            expected_old_text.as_deref(),
            &expected_new_text,
        )
        .await?;

    OutputWriter::new(format).write_switch(&outcome)?;
    Ok(())
}
