//! JSON output files written by the batch driver and the strategy job.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

pub const TRANSLATIONS_FILE: &str = "translations.json";
pub const PERSONALIZED_FILE: &str = "personalized.json";
pub const VOICES_FILE: &str = "voice_assignments.json";
pub const PREVIEWS_FILE: &str = "previews.json";
pub const ENGAGEMENT_FILE: &str = "engagement_metrics.json";
pub const FAILURES_FILE: &str = "failures.json";
pub const METRICS_FILE: &str = "metrics.json";
pub const STRATEGY_FILE: &str = "strategy_report.json";

/// Write `value` as pretty JSON, creating the parent directory if needed.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_json_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("out.json");

        write_json(&path, &vec![1, 2, 3]).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let parsed: Vec<u32> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, vec![1, 2, 3]);
    }

    #[test]
    fn test_write_json_preserves_unicode() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("unicode.json");

        write_json(&path, "ॐ शान्तिः").unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("ॐ शान्तिः"));
    }
}
