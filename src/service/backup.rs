use crate::models::backed_up_file::BackedUpFile;
use crate::models::error::{BackupError, Result};
use crate::models::file_state::FileState;
use crate::models::source_entry::SourceEntry;
use crate::service::detector::observe;
use crate::service::hash::HashPolicy;
use crate::utils::paths::{make_safe_filename, run_directory_name};
use chrono::{DateTime, Local};
use log::{info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Destination shared by every file copied in one run
#[derive(Debug, Clone)]
pub struct BackupRun {
    backup_root: PathBuf,
    directory_name: String,
}

impl BackupRun {
    pub fn new(backup_root: PathBuf, started: &DateTime<Local>) -> Self {
        BackupRun {
            backup_root,
            directory_name: run_directory_name(started),
        }
    }

    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }

    pub fn directory_name(&self) -> &str {
        &self.directory_name
    }

    /// `<root>[/<safe name>]/<timestamp>` for the given entry
    pub fn destination_dir(&self, entry: &SourceEntry) -> PathBuf {
        let mut dir = self.backup_root.clone();
        if let Some(name) = &entry.name {
            dir.push(make_safe_filename(name));
        }
        dir.push(&self.directory_name);
        dir
    }
}

/// Copies a changed entry into the run directory and records its new state.
///
/// The entry's recorded state is only replaced once the copy has completed, so a failed
/// copy leaves it untouched and the next run retries the file.
pub fn backup(entry: &mut SourceEntry, run: &BackupRun, policy: &HashPolicy) -> Result<BackedUpFile> {
    let target = run.destination_dir(entry).join(&entry.relative_path);

    // Detection saw the file, so a missing source here vanished mid-run
    let observed = observe(&entry.path).map_err(|e| match e {
        BackupError::MissingSource { path } => BackupError::CopyFailed {
            from: path,
            to: target.clone(),
            cause: io::Error::new(io::ErrorKind::NotFound, "source vanished before copy"),
        },
        other => other,
    })?;

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|cause| BackupError::CopyFailed {
            from: entry.path.clone(),
            to: parent.to_path_buf(),
            cause,
        })?;
    }
    let target = unique_destination(target);

    info!("Copying {} to {}", entry.path.display(), target.display());
    let size = match fs::copy(&entry.path, &target) {
        Ok(size) => size,
        Err(cause) => {
            if target.exists() {
                if let Err(e) = fs::remove_file(&target) {
                    warn!("Failed to remove partial copy {}: {}", target.display(), e);
                }
            }
            return Err(BackupError::CopyFailed {
                from: entry.path.clone(),
                to: target,
                cause,
            });
        }
    };

    preserve_modified_time(&target, &observed);

    let hash = if policy.enabled {
        match policy.hash(&target) {
            Ok(hash) => Some(hash),
            Err(e) => {
                warn!("Copied {} but could not hash it: {}", target.display(), e);
                None
            }
        }
    } else {
        None
    };

    let state = FileState::new(observed.modified, size).with_hash(hash);
    entry.recorded = Some(state.clone());

    Ok(BackedUpFile {
        source: entry.path.clone(),
        destination: target,
        state,
    })
}

/// Appends `_1`, `_2`, ... to the file stem until the path is free
fn unique_destination(target: PathBuf) -> PathBuf {
    if !target.exists() {
        return target;
    }

    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = target
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1;
    loop {
        let candidate = target.with_file_name(format!("{}_{}{}", stem, counter, extension));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

fn preserve_modified_time(target: &Path, observed: &FileState) {
    let result = fs::File::options()
        .write(true)
        .open(target)
        .and_then(|file| file.set_modified(UNIX_EPOCH + observed.modified));
    if let Err(e) = result {
        warn!(
            "Could not preserve modification time on {}: {}",
            target.display(),
            e
        );
    }
}
