use crate::models::backup_record::BackupRecord;
use crate::utils::progress::format_bytes;
use std::path::PathBuf;

#[derive(Debug)]
pub struct FailedEntry {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of one run, handed to the notifier
#[derive(Debug)]
pub struct RunSummary {
    pub record: BackupRecord,
    pub unchanged: usize,
    /// Files a dry run would have backed up
    pub would_back_up: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
    pub failed: Vec<FailedEntry>,
}

impl RunSummary {
    pub fn new(record: BackupRecord) -> Self {
        RunSummary {
            record,
            unchanged: 0,
            would_back_up: Vec::new(),
            missing: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn backed_up_count(&self) -> usize {
        self.record.files.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn title(&self) -> &'static str {
        if self.has_failures() {
            "Save Backup - errors"
        } else {
            "Save Backup"
        }
    }

    pub fn message(&self) -> String {
        let mut parts = Vec::new();

        if !self.would_back_up.is_empty() {
            parts.push(format!(
                "{} file(s) would be backed up",
                self.would_back_up.len()
            ));
        } else if self.record.is_empty() {
            parts.push("No files backed up".to_string());
        } else {
            parts.push(format!(
                "{} file(s) backed up ({}) to {}",
                self.backed_up_count(),
                format_bytes(self.record.total_bytes()),
                self.record.directory_name
            ));
        }

        if !self.missing.is_empty() {
            parts.push(format!("{} source(s) missing", self.missing.len()));
        }
        if !self.failed.is_empty() {
            parts.push(format!("{} file(s) failed", self.failed.len()));
        }

        parts.join(", ")
    }
}
