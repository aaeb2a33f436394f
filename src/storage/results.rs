//! Session results persistence

use anyhow::{Context, Result};
use std::path::Path;
use uuid::Uuid;

use crate::shared::messages::ResultsPayload;

/// File name used for a session's saved results
pub fn results_file_name(session_id: Uuid) -> String {
    format!("scan-{}.json", session_id)
}

/// Save a results payload to file
pub fn save_results(payload: &ResultsPayload, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(payload)?;
    std::fs::write(path, content).with_context(|| format!("Failed to write results to {:?}", path))?;
    Ok(())
}
