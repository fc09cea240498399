use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name of the run report inside the cache directory.
pub const REPORT_FILE_NAME: &str = "run.json";

/// Summary of one pipeline run, written as JSON next to the cache artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub language: String,
    pub stages: Vec<StageRecord>,
}

/// Timing and output size of one completed stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: i64,
    /// Chars written by the stage (0 when it only removed files)
    pub output_chars: usize,
    /// Number of chunks the stage worked on, if it chunked its input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<usize>,
}

impl RunReport {
    pub fn new(language: &str) -> Self {
        Self {
            started_at: Utc::now(),
            ended_at: None,
            language: language.to_string(),
            stages: Vec::new(),
        }
    }

    pub fn record(
        &mut self,
        name: &str,
        started_at: DateTime<Utc>,
        output_chars: usize,
        chunks: Option<usize>,
    ) {
        let duration_ms = (Utc::now() - started_at).num_milliseconds();
        self.stages.push(StageRecord {
            name: name.to_string(),
            started_at,
            duration_ms,
            output_chars,
            chunks,
        });
    }

    pub fn finish(&mut self) {
        self.ended_at = Some(Utc::now());
    }

    pub fn stage(&self, name: &str) -> Option<&StageRecord> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize run report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write run report: {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read run report: {}", path.display()))?;
        serde_json::from_str(&content).context("Failed to parse run report")
    }
}
