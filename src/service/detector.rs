use crate::models::error::{BackupError, Result};
use crate::models::file_state::FileState;
use crate::models::source_entry::SourceEntry;
use crate::service::hash::HashPolicy;
use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::UNIX_EPOCH;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// The file differs from its recorded state; carries what was observed
    Changed(FileState),
    Unchanged,
}

/// Reads the current modification time and size of a file
pub fn observe(path: &Path) -> Result<FileState> {
    let metadata = fs::metadata(path).map_err(|cause| match cause.kind() {
        ErrorKind::NotFound => BackupError::MissingSource {
            path: path.to_path_buf(),
        },
        _ => BackupError::MetadataError {
            path: path.to_path_buf(),
            cause,
        },
    })?;

    let modified = metadata
        .modified()
        .map_err(|cause| BackupError::MetadataError {
            path: path.to_path_buf(),
            cause,
        })?
        .duration_since(UNIX_EPOCH)
        .map_err(|cause| BackupError::ModificationTimeError {
            path: path.to_path_buf(),
            cause,
        })?;

    Ok(FileState::new(modified, metadata.len()))
}

/// Decides whether an entry needs backing up. Never writes anything.
pub fn detect(entry: &SourceEntry, policy: &HashPolicy) -> Result<Detection> {
    let observed = observe(&entry.path)?;

    let recorded = match &entry.recorded {
        Some(recorded) => recorded,
        None => {
            debug!("{} has no recorded state", entry.display_name());
            return Ok(Detection::Changed(hash_if_enabled(entry, observed, policy)?));
        }
    };

    let newer = observed.modified > recorded.modified;

    if !policy.enabled {
        return Ok(if newer {
            Detection::Changed(observed)
        } else {
            Detection::Unchanged
        });
    }

    if newer && policy.skip_if_newer {
        return Ok(Detection::Changed(observed));
    }

    let observed = hash_if_enabled(entry, observed, policy)?;
    if observed.hash.is_some() && observed.hash == recorded.hash {
        if newer {
            debug!(
                "{} was touched but its contents match the last backup",
                entry.display_name()
            );
        }
        Ok(Detection::Unchanged)
    } else {
        Ok(Detection::Changed(observed))
    }
}

fn hash_if_enabled(entry: &SourceEntry, observed: FileState, policy: &HashPolicy) -> Result<FileState> {
    if !policy.enabled {
        return Ok(observed);
    }
    let hash = policy.hash(&entry.path)?;
    Ok(observed.with_hash(Some(hash)))
}
