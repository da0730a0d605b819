use crate::models::config_validator::validate_config;
use crate::models::error::{BackupError, Result};
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source_directories: Vec<BackupSource>,
    pub backup_directory: String,
    #[serde(default = "default_state_file")]
    pub state_file: String,
    #[serde(default = "bool_false")]
    pub hash_check: bool,
    #[serde(default = "bool_true")]
    pub skip_source_hash_check_if_newer: bool,
    #[serde(default)]
    pub max_mebibytes_for_hash: Option<usize>,
    #[serde(default = "bool_true")]
    pub notifications: bool,
    #[serde(default)]
    pub notification_command: Option<Vec<String>>,
}

/// One entry of `source_directories`: either a bare path or a detailed object
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawSource")]
pub struct BackupSource {
    pub path: String,
    pub name: Option<String>,
    pub extensions: Vec<String>,
    pub max_depth: usize,
    pub skip_dirs: Vec<String>,
    pub numeric_dirs_only: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSource {
    Path(String),
    Detailed {
        path: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default = "vec_default")]
        extensions: Vec<String>,
        #[serde(default = "usize_max")]
        max_depth: usize,
        #[serde(default = "vec_default")]
        skip_dirs: Vec<String>,
        #[serde(default = "bool_false")]
        numeric_dirs_only: bool,
    },
}

impl From<RawSource> for BackupSource {
    fn from(raw: RawSource) -> Self {
        match raw {
            RawSource::Path(path) => BackupSource::from_path(path),
            RawSource::Detailed {
                path,
                name,
                extensions,
                max_depth,
                skip_dirs,
                numeric_dirs_only,
            } => BackupSource {
                path,
                name,
                extensions,
                max_depth,
                skip_dirs,
                numeric_dirs_only,
            },
        }
    }
}

impl BackupSource {
    pub fn from_path(path: impl Into<String>) -> Self {
        BackupSource {
            path: path.into(),
            name: None,
            extensions: vec_default(),
            max_depth: usize_max(),
            skip_dirs: vec_default(),
            numeric_dirs_only: bool_false(),
        }
    }
}

const BYTES_PER_MEBIBYTE: usize = 1024 * 1024;

impl Config {
    /// Hash limit in bytes. Saturates, though validation already rejects limits that overflow.
    pub fn max_bytes_for_hash(&self) -> Option<usize> {
        self.max_mebibytes_for_hash
            .map(|mib| mib.saturating_mul(BYTES_PER_MEBIBYTE))
    }
}

/// `None` when `mebibytes` cannot be expressed in bytes on this platform
pub fn mebibytes_to_bytes(mebibytes: usize) -> Option<usize> {
    mebibytes.checked_mul(BYTES_PER_MEBIBYTE)
}

fn default_state_file() -> String {
    "backup_state.json".to_string()
}
const fn vec_default() -> Vec<String> {
    Vec::new()
}
const fn usize_max() -> usize {
    usize::MAX
}
const fn bool_false() -> bool {
    false
}
const fn bool_true() -> bool {
    true
}

pub fn setup_config(config_file: String) -> Result<Config> {
    let config_path = PathBuf::from(config_file);
    info!("Loading config from: {}", config_path.display());

    let config_str = fs::read_to_string(&config_path).map_err(|cause| {
        BackupError::ConfigRead {
            path: config_path.clone(),
            cause,
        }
    })?;

    let config: Config = serde_json::from_str(&config_str).map_err(|cause| {
        BackupError::ConfigParse {
            path: config_path,
            cause,
        }
    })?;

    validate_config(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    fn escaped(dir: &TempDir) -> String {
        dir.path().to_str().unwrap().replace("\\", "\\\\")
    }

    #[test]
    fn test_load_valid_config_with_all_fields() {
        let temp_source = TempDir::new().unwrap();
        let temp_dest = TempDir::new().unwrap();

        let config_content = format!(
            r#"{{
            "source_directories": [
                "{}/game.sav",
                {{
                    "path": "{}",
                    "name": "Elden Ring",
                    "extensions": ["sl2"],
                    "max_depth": 3,
                    "skip_dirs": ["cache"],
                    "numeric_dirs_only": true
                }}
            ],
            "backup_directory": "{}",
            "state_file": "state.db",
            "hash_check": true,
            "skip_source_hash_check_if_newer": false,
            "max_mebibytes_for_hash": 4,
            "notifications": false,
            "notification_command": ["notify-send"]
        }}"#,
            escaped(&temp_source),
            escaped(&temp_source),
            escaped(&temp_dest)
        );

        let temp_file = write_config(&config_content);
        let config = setup_config(temp_file.path().to_str().unwrap().to_string()).unwrap();

        assert_eq!(config.source_directories.len(), 2);
        assert_eq!(config.source_directories[0].name, None);
        assert_eq!(config.source_directories[0].max_depth, usize::MAX);

        let detailed = &config.source_directories[1];
        assert_eq!(detailed.name.as_deref(), Some("Elden Ring"));
        assert_eq!(detailed.extensions, vec!["sl2".to_string()]);
        assert_eq!(detailed.max_depth, 3);
        assert_eq!(detailed.skip_dirs, vec!["cache".to_string()]);
        assert!(detailed.numeric_dirs_only);
        assert!(!config.source_directories[0].numeric_dirs_only);

        assert_eq!(config.state_file, "state.db");
        assert!(config.hash_check);
        assert!(!config.skip_source_hash_check_if_newer);
        assert_eq!(config.max_bytes_for_hash(), Some(4 * 1048576));
        assert!(!config.notifications);
        assert_eq!(
            config.notification_command,
            Some(vec!["notify-send".to_string()])
        );
    }

    #[test]
    fn test_load_config_with_defaults() {
        let temp_dir = TempDir::new().unwrap();

        let config_content = format!(
            r#"{{
            "source_directories": ["{}"],
            "backup_directory": "{}"
        }}"#,
            escaped(&temp_dir),
            escaped(&temp_dir)
        );

        let temp_file = write_config(&config_content);
        let config = setup_config(temp_file.path().to_str().unwrap().to_string()).unwrap();

        assert_eq!(config.state_file, "backup_state.json");
        assert!(!config.hash_check);
        assert!(config.skip_source_hash_check_if_newer);
        assert_eq!(config.max_bytes_for_hash(), None);
        assert!(config.notifications);
        assert_eq!(config.notification_command, None);
    }

    #[test]
    fn test_hash_limit_saturates_instead_of_wrapping() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            source_directories: vec![BackupSource::from_path(temp_dir.path().to_str().unwrap())],
            backup_directory: temp_dir.path().to_str().unwrap().to_string(),
            state_file: default_state_file(),
            hash_check: true,
            skip_source_hash_check_if_newer: false,
            max_mebibytes_for_hash: Some(usize::MAX / 2),
            notifications: true,
            notification_command: None,
        };

        assert_eq!(config.max_bytes_for_hash(), Some(usize::MAX));
        assert_eq!(mebibytes_to_bytes(usize::MAX / 2), None);
        assert_eq!(mebibytes_to_bytes(4), Some(4 * 1048576));
    }

    #[test]
    fn test_error_on_missing_config_file() {
        let result = setup_config("/this/does/not/exist/config.json".to_string());

        match result {
            Err(BackupError::ConfigRead { .. }) => {}
            _ => panic!("Expected ConfigRead error"),
        }
    }

    #[test]
    fn test_error_on_invalid_json() {
        let temp_file = write_config(
            r#"{
            "source_directories": [
                "path": "."
            ],
            "backup_directory": "."
        }"#,
        );

        let result = setup_config(temp_file.path().to_str().unwrap().to_string());

        match result {
            Err(BackupError::ConfigParse { .. }) => {}
            _ => panic!("Expected ConfigParse error"),
        }
    }

    #[test]
    fn test_error_on_missing_required_fields() {
        let temp_file = write_config(r#"{ "backup_directory": "." }"#);

        let result = setup_config(temp_file.path().to_str().unwrap().to_string());

        match result {
            Err(BackupError::ConfigParse { .. }) => {}
            _ => panic!("Expected ConfigParse error for missing source_directories"),
        }
    }

    #[test]
    fn test_error_on_source_object_without_path() {
        let temp_file = write_config(
            r#"{
            "source_directories": [{ "name": "No Path" }],
            "backup_directory": "."
        }"#,
        );

        let result = setup_config(temp_file.path().to_str().unwrap().to_string());

        assert!(matches!(result, Err(BackupError::ConfigParse { .. })));
    }
}
