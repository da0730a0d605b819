pub mod json_state;
pub mod sqlite;

use crate::models::backup_record::BackupRecord;
use crate::models::error::Result;
use crate::models::file_state::FileState;
use crate::utils::paths::expand_path;
use json_state::JsonStateStore;
use sqlite::SqliteStateStore;
use std::collections::BTreeMap;

/// Recorded state keyed by source path
pub type StateMap = BTreeMap<String, FileState>;

/// Persists the path -> last backed-up state record between runs
pub trait StateStore {
    fn load(&mut self) -> Result<StateMap>;

    fn save(&mut self, state: &StateMap) -> Result<()>;

    /// Keeps a history of completed runs where the backend supports it
    fn record_backup(&mut self, _record: &BackupRecord) -> Result<()> {
        Ok(())
    }

    fn describe(&self) -> String;
}

const SQLITE_EXTENSIONS: &[&str] = &["db", "sqlite", "sqlite3"];

/// Picks the backend from the configured file name
pub fn open_state_store(state_file: &str) -> Result<Box<dyn StateStore>> {
    if state_file == ":memory:" {
        return Ok(Box::new(SqliteStateStore::open(state_file)?));
    }

    let path = expand_path(state_file);
    let is_sqlite = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| SQLITE_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(e)))
        .unwrap_or(false);

    if is_sqlite {
        Ok(Box::new(SqliteStateStore::open(&path.to_string_lossy())?))
    } else {
        Ok(Box::new(JsonStateStore::new(path)))
    }
}
