use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Last observed state of a watched file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileState {
    /// Modification time as a duration since the UNIX epoch
    pub modified: Duration,
    pub size: u64,
    /// Hex encoded BLAKE2b-512 of the file contents, when hashing is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl FileState {
    pub fn new(modified: Duration, size: u64) -> Self {
        FileState {
            modified,
            size,
            hash: None,
        }
    }

    pub fn with_hash(mut self, hash: Option<String>) -> Self {
        self.hash = hash;
        self
    }
}
