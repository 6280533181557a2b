//! JSON summary of a batch run

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::batch::FileOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Converted,
    Failed,
}

/// One file's entry in the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub source: String,
    pub destination: String,
    pub status: FileStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&FileOutcome> for ReportEntry {
    fn from(outcome: &FileOutcome) -> Self {
        let (status, error_kind, error) = match &outcome.result {
            Ok(()) => (FileStatus::Converted, None, None),
            Err(e) => (
                FileStatus::Failed,
                Some(e.kind().to_string()),
                Some(e.to_string()),
            ),
        };
        Self {
            source: outcome.source.clone(),
            destination: outcome.destination.clone(),
            status,
            error_kind,
            error,
        }
    }
}

/// Summary written by `--report`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub converted: usize,
    pub failed: usize,
    pub files: Vec<ReportEntry>,
}

impl BatchReport {
    pub fn new(
        started_at: DateTime<Local>,
        input_dir: &Path,
        output_dir: &Path,
        outcomes: &[FileOutcome],
    ) -> Self {
        let files: Vec<ReportEntry> = outcomes.iter().map(ReportEntry::from).collect();
        let converted = files
            .iter()
            .filter(|f| f.status == FileStatus::Converted)
            .count();

        Self {
            started_at,
            finished_at: Local::now(),
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            converted,
            failed: files.len() - converted,
            files,
        }
    }

    /// Write the report as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize report: {}", e))?;
        std::fs::write(path, json).map_err(|e| format!("Failed to write report file: {}", e))
    }
}
