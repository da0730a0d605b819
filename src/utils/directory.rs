use crate::models::error::{BackupError, Result};
use log::warn;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Lists files below `dir`, skipping named directories and keeping only wanted extensions.
///
/// With `numeric_dirs_only`, a file is kept only when it sits directly inside a directory
/// whose name is all digits (the per-account profile folders many games use).
///
/// Unreadable entries below the root are logged and skipped; only a root that cannot be
/// read is an error.
pub fn get_files_in_path(
    dir: &Path,
    skip_dirs: &[String],
    extensions: &[String],
    max_depth: usize,
    numeric_dirs_only: bool,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .max_depth(max_depth)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e.path(), e.file_type().is_dir(), e.depth(), skip_dirs))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(BackupError::DirectoryRead(e.to_string())),
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", dir.display(), e);
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        if numeric_dirs_only && (entry.depth() < 2 || !in_numeric_dir(entry.path())) {
            continue;
        }
        if has_wanted_extension(entry.path(), extensions) {
            files.push(entry.path().to_path_buf());
        }
    }
    Ok(files)
}

fn in_numeric_dir(path: &Path) -> bool {
    path.parent()
        .and_then(Path::file_name)
        .and_then(OsStr::to_str)
        .map(|name| !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

fn is_skipped_dir(path: &Path, is_dir: bool, depth: usize, skip_dirs: &[String]) -> bool {
    // The root itself is never skipped
    if !is_dir || depth == 0 {
        return false;
    }
    path.file_name()
        .and_then(OsStr::to_str)
        .map(|name| skip_dirs.iter().any(|skip| skip == name))
        .unwrap_or(false)
}

fn has_wanted_extension(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    match path.extension().and_then(OsStr::to_str) {
        Some(ext) => extensions
            .iter()
            .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext)),
        None => false,
    }
}
