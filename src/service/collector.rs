use crate::models::config::BackupSource;
use crate::models::run_summary::FailedEntry;
use crate::models::source_entry::{state_key, SourceEntry};
use crate::repo::StateMap;
use crate::utils::directory::get_files_in_path;
use crate::utils::paths::expand_path;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct CollectedSources {
    pub entries: Vec<SourceEntry>,
    pub missing: Vec<PathBuf>,
    pub failed: Vec<FailedEntry>,
}

/// Expands configured sources into watched files with their recorded state attached
pub fn collect_entries(sources: &[BackupSource], state: &StateMap) -> CollectedSources {
    info!("Collecting files from {} configured sources...", sources.len());

    let mut collected = CollectedSources::default();
    let mut seen = HashSet::new();

    for source in sources {
        let root = expand_path(&source.path);

        let files = if root.is_file() {
            vec![root.clone()]
        } else if root.is_dir() {
            match get_files_in_path(
                &root,
                &source.skip_dirs,
                &source.extensions,
                source.max_depth,
                source.numeric_dirs_only,
            ) {
                Ok(files) => files,
                Err(e) => {
                    warn!("Failed to read source {}: {}", root.display(), e);
                    collected.failed.push(FailedEntry {
                        path: root,
                        reason: e.to_string(),
                    });
                    continue;
                }
            }
        } else {
            warn!("Source does not exist, skipping: {}", root.display());
            collected.missing.push(root);
            continue;
        };

        if files.is_empty() {
            info!("No matching files found in {}", root.display());
        }

        for file in files {
            if !seen.insert(file.clone()) {
                warn!(
                    "{} is covered by more than one source; using the first",
                    file.display()
                );
                continue;
            }

            let mut entry = SourceEntry::new(
                file.clone(),
                source.name.clone(),
                relative_to_source(&root, &file),
            );
            entry.recorded = state.get(&state_key(&file)).cloned();
            debug!(
                "Watching {} (recorded: {})",
                entry.display_name(),
                entry.recorded.is_some()
            );
            collected.entries.push(entry);
        }
    }

    info!("Watching {} files", collected.entries.len());
    collected
}

fn relative_to_source(root: &Path, file: &Path) -> PathBuf {
    match file.strip_prefix(root) {
        Ok(relative) if !relative.as_os_str().is_empty() => relative.to_path_buf(),
        _ => file
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| file.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::file_state::FileState;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_file_source_yields_single_entry_with_state() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("game.sav");
        fs::write(&file, b"save").unwrap();

        let mut state = StateMap::new();
        let recorded = FileState::new(Duration::from_secs(7), 4);
        state.insert(state_key(&file), recorded.clone());

        let collected = collect_entries(
            &[BackupSource::from_path(file.to_str().unwrap())],
            &state,
        );

        assert_eq!(collected.entries.len(), 1);
        let entry = &collected.entries[0];
        assert_eq!(entry.relative_path, PathBuf::from("game.sav"));
        assert_eq!(entry.recorded, Some(recorded));
    }

    #[test]
    fn test_directory_source_keeps_relative_paths() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("7656")).unwrap();
        fs::write(dir.path().join("7656").join("ER0000.sl2"), b"save").unwrap();
        fs::write(dir.path().join("notes.txt"), b"notes").unwrap();

        let source = BackupSource {
            name: Some("Elden Ring".to_string()),
            extensions: vec!["sl2".to_string()],
            ..BackupSource::from_path(dir.path().to_str().unwrap())
        };
        let collected = collect_entries(&[source], &StateMap::new());

        assert_eq!(collected.entries.len(), 1);
        let entry = &collected.entries[0];
        assert_eq!(entry.name.as_deref(), Some("Elden Ring"));
        assert_eq!(entry.relative_path, PathBuf::from("7656").join("ER0000.sl2"));
        assert!(entry.recorded.is_none());
    }

    #[test]
    fn test_missing_source_is_reported_and_others_kept() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("game.sav");
        fs::write(&file, b"save").unwrap();
        let missing = dir.path().join("gone.sav");

        let collected = collect_entries(
            &[
                BackupSource::from_path(missing.to_str().unwrap()),
                BackupSource::from_path(file.to_str().unwrap()),
            ],
            &StateMap::new(),
        );

        assert_eq!(collected.missing, vec![missing]);
        assert_eq!(collected.entries.len(), 1);
    }

    #[test]
    fn test_duplicate_files_are_collected_once() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("game.sav");
        fs::write(&file, b"save").unwrap();

        let collected = collect_entries(
            &[
                BackupSource::from_path(file.to_str().unwrap()),
                BackupSource::from_path(dir.path().to_str().unwrap()),
            ],
            &StateMap::new(),
        );

        assert_eq!(collected.entries.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_keeps_valid_saves_watched() {
        let dir = TempDir::new().unwrap();
        let profile = dir.path().join("b_profile");
        fs::create_dir_all(&profile).unwrap();
        fs::write(profile.join("ER0000.sl2"), b"save").unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("a_loop")).unwrap();

        let collected = collect_entries(
            &[BackupSource::from_path(dir.path().to_str().unwrap())],
            &StateMap::new(),
        );

        assert!(collected.failed.is_empty());
        assert_eq!(collected.entries.len(), 1);
        assert_eq!(
            collected.entries[0].relative_path,
            PathBuf::from("b_profile").join("ER0000.sl2")
        );
    }

    #[test]
    fn test_numeric_dirs_only_ignores_saves_outside_profiles() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("76561198000000000")).unwrap();
        fs::create_dir_all(dir.path().join("backup")).unwrap();
        fs::write(dir.path().join("76561198000000000").join("ER0000.sl2"), b"save").unwrap();
        fs::write(dir.path().join("backup").join("ER0000.sl2"), b"old").unwrap();

        let source = BackupSource {
            extensions: vec!["sl2".to_string()],
            numeric_dirs_only: true,
            ..BackupSource::from_path(dir.path().to_str().unwrap())
        };
        let collected = collect_entries(&[source], &StateMap::new());

        assert_eq!(collected.entries.len(), 1);
        assert_eq!(
            collected.entries[0].relative_path,
            PathBuf::from("76561198000000000").join("ER0000.sl2")
        );
    }
}
