use crate::models::backed_up_file::BackedUpFile;
use std::path::PathBuf;

/// Files copied during one run, grouped under the run's directory name
#[derive(Debug, Clone)]
pub struct BackupRecord {
    /// Timestamped directory name shared by every file of the run
    pub directory_name: String,
    pub backup_root: PathBuf,
    pub files: Vec<BackedUpFile>,
}

impl BackupRecord {
    pub fn new(directory_name: String, backup_root: PathBuf) -> Self {
        BackupRecord {
            directory_name,
            backup_root,
            files: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.state.size).sum()
    }
}
