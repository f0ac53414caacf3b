use anyhow::Result;

use crate::client::CrowdinApi;
use crate::core::output::OutputWriter;
use crate::OutputFormat;

pub async fn run(api: &dyn CrowdinApi, project_id: u64, format: &OutputFormat) -> Result<()> {
    let progress = api.project_progress(project_id).await?;
    OutputWriter::new(format).write_progress(&progress)?;
    Ok(())
}
