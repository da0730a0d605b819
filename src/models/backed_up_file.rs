use crate::models::file_state::FileState;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct BackedUpFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub state: FileState,
}
