use crate::models::backup_record::BackupRecord;
use crate::models::config::Config;
use crate::models::dry_run_mode::DryRunMode;
use crate::models::error::{BackupError, Result};
use crate::models::run_summary::{FailedEntry, RunSummary};
use crate::models::source_entry::SourceEntry;
use crate::repo::{StateMap, StateStore};
use crate::service::backup::{backup, BackupRun};
use crate::service::collector::collect_entries;
use crate::service::detector::{detect, Detection};
use crate::service::hash::HashPolicy;
use crate::utils::paths::expand_path;
use crate::utils::progress::{create_progress_bar, create_spinner, format_bytes};
use chrono::{DateTime, Local};
use indicatif::ProgressBar;
use log::{error, info, warn};

/// Performs one complete run: collect, detect, copy, persist state.
///
/// Per-entry problems end up in the returned summary; only state store failures
/// are returned as errors.
pub fn run_backup(
    config: &Config,
    store: &mut dyn StateStore,
    dry_run_mode: DryRunMode,
    started: DateTime<Local>,
    show_progress: bool,
) -> Result<RunSummary> {
    info!("Loading recorded state from {}", store.describe());
    let mut state = store.load()?;

    let spinner = show_progress.then(|| {
        create_spinner(&format!(
            "{}[1/2] Collecting source files...",
            dry_run_mode.progress_prefix()
        ))
    });
    let collected = collect_entries(&config.source_directories, &state);
    if let Some(spinner) = spinner {
        spinner.finish_with_message(format!(
            "{}[1/2] Watching {} files",
            dry_run_mode.progress_prefix(),
            collected.entries.len()
        ));
    }

    let run = BackupRun::new(expand_path(&config.backup_directory), &started);
    let policy = HashPolicy::from_config(config, dry_run_mode);

    let mut summary = RunSummary::new(BackupRecord::new(
        run.directory_name().to_string(),
        run.backup_root().to_path_buf(),
    ));
    summary.missing.extend(collected.missing);
    summary.failed.extend(collected.failed);

    let bar = show_progress.then(|| {
        create_progress_bar(
            collected.entries.len() as u64,
            &format!("{}[2/2] Checking saves", dry_run_mode.progress_prefix()),
        )
    });

    let mut state_changed = false;
    for mut entry in collected.entries {
        if let Some(bar) = &bar {
            bar.set_message(entry.display_name());
        }

        if process_entry(&mut entry, &run, &policy, dry_run_mode, &mut summary) {
            if let Some(recorded) = &entry.recorded {
                state.insert(entry.state_key(), recorded.clone());
                state_changed = true;
            }
        }

        if let Some(bar) = &bar {
            bar.inc(1);
        }
    }
    finish_bar(bar, &summary);

    if dry_run_mode.should_update_state() {
        persist(store, &state, state_changed, &summary.record)?;
    }
    if dry_run_mode.is_dry_run() {
        info!("DRY RUN completed - no files were copied and no state was written");
    }

    info!(
        "Process complete. {} files backed up ({}), {} unchanged, {} missing, {} failed.",
        summary.backed_up_count(),
        format_bytes(summary.record.total_bytes()),
        summary.unchanged,
        summary.missing.len(),
        summary.failed.len()
    );
    Ok(summary)
}

/// Returns true when the entry was copied and its recorded state moved forward
fn process_entry(
    entry: &mut SourceEntry,
    run: &BackupRun,
    policy: &HashPolicy,
    dry_run_mode: DryRunMode,
    summary: &mut RunSummary,
) -> bool {
    let outcome = match detect(entry, policy) {
        Ok(Detection::Unchanged) => {
            info!("Skipping {} as it has not been modified", entry.display_name());
            summary.unchanged += 1;
            return false;
        }
        Ok(Detection::Changed(_)) if !dry_run_mode.should_copy_files() => {
            info!(
                "{}{} is new or modified and would be backed up",
                dry_run_mode.progress_prefix(),
                entry.display_name()
            );
            summary.would_back_up.push(entry.path.clone());
            return false;
        }
        Ok(Detection::Changed(_)) => {
            info!("{} is new or modified", entry.display_name());
            backup(entry, run, policy)
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(backed_up) => {
            summary.record.files.push(backed_up);
            true
        }
        Err(BackupError::MissingSource { path }) => {
            warn!("Source disappeared, skipping: {}", path.display());
            summary.missing.push(path);
            false
        }
        Err(e) => {
            error!("Failed to back up {}: {}", entry.display_name(), e);
            summary.failed.push(FailedEntry {
                path: entry.path.clone(),
                reason: e.to_string(),
            });
            false
        }
    }
}

fn persist(
    store: &mut dyn StateStore,
    state: &StateMap,
    state_changed: bool,
    record: &BackupRecord,
) -> Result<()> {
    if !state_changed {
        info!("Nothing changed, state left as is");
        return Ok(());
    }
    store.save(state)?;
    info!("Saved state to {}", store.describe());
    store.record_backup(record)
}

fn finish_bar(bar: Option<ProgressBar>, summary: &RunSummary) {
    if let Some(bar) = bar {
        bar.finish_with_message(summary.message());
    }
}
