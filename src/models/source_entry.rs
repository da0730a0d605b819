use crate::models::file_state::FileState;
use std::path::{Path, PathBuf};

/// A watched file and the state it had when it was last backed up
#[derive(Debug, Clone)]
pub struct SourceEntry {
    pub path: PathBuf,
    /// Name of the configured source this file belongs to, e.g. a game title
    pub name: Option<String>,
    /// Path below the configured source root; just the file name for a file source
    pub relative_path: PathBuf,
    pub recorded: Option<FileState>,
}

impl SourceEntry {
    pub fn new(path: PathBuf, name: Option<String>, relative_path: PathBuf) -> Self {
        SourceEntry {
            path,
            name,
            relative_path,
            recorded: None,
        }
    }

    /// Key under which this entry's state is persisted
    pub fn state_key(&self) -> String {
        state_key(&self.path)
    }

    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => format!("{}| {}", name, self.relative_path.display()),
            None => self.path.display().to_string(),
        }
    }
}

pub fn state_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
