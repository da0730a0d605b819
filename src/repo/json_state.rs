use crate::models::error::{BackupError, Result};
use crate::repo::{StateMap, StateStore};
use log::{debug, info};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// State kept as a pretty printed JSON object next to the config
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: PathBuf) -> Self {
        JsonStateStore { path }
    }
}

impl StateStore for JsonStateStore {
    fn load(&mut self) -> Result<StateMap> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(cause) if cause.kind() == ErrorKind::NotFound => {
                info!(
                    "No state file at {}, starting with empty state",
                    self.path.display()
                );
                return Ok(StateMap::new());
            }
            Err(cause) => {
                return Err(BackupError::StateRead {
                    path: self.path.clone(),
                    cause,
                })
            }
        };

        let state: StateMap =
            serde_json::from_str(&content).map_err(|cause| BackupError::StateParse {
                path: self.path.clone(),
                cause,
            })?;
        debug!("Loaded {} recorded files from {}", state.len(), self.path.display());
        Ok(state)
    }

    fn save(&mut self, state: &StateMap) -> Result<()> {
        let to_write_error = |cause| BackupError::StateWrite {
            path: self.path.clone(),
            cause,
        };

        let content = serde_json::to_string_pretty(state)
            .map_err(|e| to_write_error(std::io::Error::other(e)))?;

        // Written beside the target and renamed so a crash never leaves half a file
        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        fs::write(&temp_path, content).map_err(to_write_error)?;
        fs::rename(&temp_path, &self.path).map_err(to_write_error)?;

        debug!("Saved {} recorded files to {}", state.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("JSON state file {}", self.path.display())
    }
}
