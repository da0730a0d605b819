use crate::models::config::{mebibytes_to_bytes, BackupSource, Config};
use crate::models::error::{BackupError, Result};
use crate::utils::paths::expand_path;
use log::{info, warn};

/// Validates the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    info!("Validating configuration...");

    validate_numeric_values(config)?;

    validate_backup_sources(&config.source_directories)?;

    validate_backup_directory(&config.backup_directory)?;

    validate_state_file(&config.state_file)?;

    validate_notification_command(config)?;

    check_conflicting_flags(config);

    info!("Configuration validation passed");
    Ok(())
}

fn validate_numeric_values(config: &Config) -> Result<()> {
    if config.max_mebibytes_for_hash == Some(0) {
        return Err(BackupError::ConfigInvalid(
            "max_mebibytes_for_hash must be greater than 0 (omit it to hash whole files)"
                .to_string(),
        ));
    }
    if let Some(mib) = config.max_mebibytes_for_hash {
        if mebibytes_to_bytes(mib).is_none() {
            return Err(BackupError::ConfigInvalid(format!(
                "max_mebibytes_for_hash of {} is too large to express in bytes",
                mib
            )));
        }
    }
    Ok(())
}

/// Sources may be missing at validation time; that is reported per run, not here
fn validate_backup_sources(sources: &[BackupSource]) -> Result<()> {
    if sources.is_empty() {
        return Err(BackupError::ConfigInvalid(
            "At least one entry in source_directories must be configured".to_string(),
        ));
    }

    for (idx, source) in sources.iter().enumerate() {
        if source.path.trim().is_empty() {
            return Err(BackupError::ConfigInvalid(format!(
                "Source #{} has an empty path",
                idx + 1
            )));
        }

        if let Some(name) = &source.name {
            if name.trim().is_empty() {
                return Err(BackupError::ConfigInvalid(format!(
                    "Source #{} has an empty name",
                    idx + 1
                )));
            }
        }

        if source.max_depth == 0 {
            return Err(BackupError::ConfigInvalid(format!(
                "Source #{} has max_depth of 0, which means no files will be found. Set max_depth to at least 1.",
                idx + 1
            )));
        }

        if source.numeric_dirs_only && source.max_depth < 2 {
            warn!(
                "Source #{} has numeric_dirs_only with max_depth {}, so no profile folder files can match",
                idx + 1,
                source.max_depth
            );
        }

        let path = expand_path(&source.path);
        if !path.exists() {
            warn!(
                "Source #{} does not exist yet and will be skipped until it does: {}",
                idx + 1,
                path.display()
            );
        }
    }

    Ok(())
}

fn validate_backup_directory(backup_directory: &str) -> Result<()> {
    if backup_directory.trim().is_empty() {
        return Err(BackupError::ConfigInvalid(
            "backup_directory must not be empty".to_string(),
        ));
    }

    let path = expand_path(backup_directory);
    if path.exists() && !path.is_dir() {
        return Err(BackupError::ConfigInvalid(format!(
            "backup_directory exists but is not a directory: {}",
            path.display()
        )));
    }

    if !path.exists() {
        warn!(
            "backup_directory does not exist but will be created: {}",
            path.display()
        );
    }

    Ok(())
}

fn validate_state_file(state_file: &str) -> Result<()> {
    if state_file.trim().is_empty() {
        return Err(BackupError::ConfigInvalid(
            "state_file must not be empty".to_string(),
        ));
    }

    let path = expand_path(state_file);
    if path.is_dir() {
        return Err(BackupError::ConfigInvalid(format!(
            "state_file points at a directory: {}",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        // An empty parent is the current directory
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(BackupError::ConfigInvalid(format!(
                "state_file parent directory does not exist: {}",
                parent.display()
            )));
        }
    }

    Ok(())
}

fn validate_notification_command(config: &Config) -> Result<()> {
    if let Some(command) = &config.notification_command {
        match command.first() {
            Some(program) if !program.trim().is_empty() => {}
            _ => {
                return Err(BackupError::ConfigInvalid(
                    "notification_command must name a program to run".to_string(),
                ))
            }
        }
    }
    Ok(())
}

fn check_conflicting_flags(config: &Config) {
    if !config.hash_check {
        if config.max_mebibytes_for_hash.is_some() {
            warn!("max_mebibytes_for_hash is set but hash_check is disabled, so it has no effect");
        }
        return;
    }

    if config.skip_source_hash_check_if_newer {
        info!("skip_source_hash_check_if_newer is enabled - newer source files will skip hash verification");
    }
    if config.max_mebibytes_for_hash.is_some() {
        warn!("max_mebibytes_for_hash limits hashing to the start of each file; changes past that point are only caught by modification time");
    }
}
