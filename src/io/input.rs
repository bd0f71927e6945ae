use std::path::Path;

use anyhow::{Context, Result};

use crate::models::TranscriptResult;

/// Parse a job-result JSON file into a TranscriptResult
pub fn load_result_file(path: &Path) -> Result<TranscriptResult> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    parse_result_json(&content)
}

/// Parse a job-result JSON string into a TranscriptResult
pub fn parse_result_json(json: &str) -> Result<TranscriptResult> {
    serde_json::from_str(json).context("Failed to parse job-result JSON")
}
