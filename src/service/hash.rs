use crate::models::config::Config;
use crate::models::dry_run_mode::DryRunMode;
use crate::models::error::{BackupError, Result};
use blake2::{Blake2b512, Digest};
use std::fs;
use std::io::{BufReader, Read};
use std::path::Path;

/// When and how far file contents are hashed during detection and backup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HashPolicy {
    pub enabled: bool,
    /// A newer modification time is taken as a change without hashing
    pub skip_if_newer: bool,
    pub max_bytes: Option<usize>,
}

impl HashPolicy {
    pub fn from_config(config: &Config, dry_run_mode: DryRunMode) -> Self {
        HashPolicy {
            enabled: config.hash_check && dry_run_mode.should_hash(),
            skip_if_newer: config.skip_source_hash_check_if_newer,
            max_bytes: config.max_bytes_for_hash(),
        }
    }

    pub fn hash(&self, file: &Path) -> Result<String> {
        hash_file(file, self.max_bytes)
    }
}

/// Hex encoded BLAKE2b-512 of a file, reading at most `max_bytes` when given
pub fn hash_file(file: &Path, max_bytes: Option<usize>) -> Result<String> {
    let to_hash_error = |cause| BackupError::HashError {
        path: file.to_path_buf(),
        cause,
    };
    let reader = BufReader::new(fs::File::open(file).map_err(to_hash_error)?);
    hasher(reader, max_bytes).map_err(to_hash_error)
}

fn hasher<R: Read>(mut reader: BufReader<R>, max_bytes: Option<usize>) -> std::io::Result<String> {
    let mut hasher = Blake2b512::new();
    let mut buffer = [0; 8192];
    let mut bytes_read = 0;
    let limit = max_bytes.unwrap_or(usize::MAX);

    while bytes_read < limit {
        let count = reader.read(&mut buffer)?;
        if count == 0 {
            break;
        }
        let take = count.min(limit - bytes_read);
        hasher.update(&buffer[..take]);
        bytes_read += take;
    }
    Ok(hex::encode(hasher.finalize()))
}
