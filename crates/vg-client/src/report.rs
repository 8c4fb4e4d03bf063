use std::path::{Path, PathBuf};
use tokio::fs;
use vg_core::JobResult;
use crate::error::Result;

pub const AGGREGATE_FILE: &str = "all_results.json";

pub fn job_file_name(index: usize) -> String {
    format!("job_{index}.json")
}

/// Writes one job's result as pretty JSON and returns where it went.
pub async fn write_job_result(dir: &Path, result: &JobResult) -> Result<PathBuf> {
    fs::create_dir_all(dir).await?;
    let path = dir.join(job_file_name(result.index));
    fs::write(&path, serde_json::to_vec_pretty(result)?).await?;
    Ok(path)
}

/// Writes every result, in the order given, to `all_results.json`.
pub async fn write_aggregate(dir: &Path, results: &[JobResult]) -> Result<PathBuf> {
    fs::create_dir_all(dir).await?;
    let path = dir.join(AGGREGATE_FILE);
    fs::write(&path, serde_json::to_vec_pretty(results)?).await?;
    Ok(path)
}

pub fn render_summary(results: &[JobResult]) -> String {
    let done = results.iter().filter(|r| r.status.is_success()).count();
    let mut out = format!("{done}/{} jobs completed\n", results.len());
    for result in results {
        out.push_str("  ");
        out.push_str(&result.summary_line());
        out.push('\n');
    }
    out
}
