use crate::models::backup_record::BackupRecord;
use crate::models::error::{BackupError, Result};
use crate::models::file_state::FileState;
use crate::repo::{StateMap, StateStore};
use log::{debug, info};
use rusqlite::Connection;
use std::time::Duration;

pub struct SqliteStateStore {
    conn: Connection,
    db_file: String,
}

impl SqliteStateStore {
    pub fn open(db_file: &str) -> Result<Self> {
        info!("Opening state database: {}", db_file);

        let conn = if db_file == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(db_file)
        }
        .map_err(|cause| BackupError::DatabaseConnection {
            path: db_file.to_string(),
            cause,
        })?;

        let store = SqliteStateStore {
            conn,
            db_file: db_file.to_string(),
        };
        store.setup_database()?;
        Ok(store)
    }

    fn setup_database(&self) -> Result<()> {
        debug!("Initializing database schema");
        let setup_queries = "BEGIN;
    PRAGMA ENCODING = 'UTF-8';

    CREATE TABLE IF NOT EXISTS Source_State(
        File_Path      TEXT    not null
            constraint Source_State_pk
                primary key,
        Modified_Secs  integer not null,
        Modified_Nanos integer not null,
        File_Size      integer not null,
        Hash           TEXT);

    CREATE TABLE IF NOT EXISTS Backup_Runs(
        ID             integer not null
            constraint Backup_Runs_ID_pk
                primary key autoincrement,
        Backup_Root    TEXT    not null,
        Directory_Name TEXT    not null,
        File_Count     integer not null,
        Total_Bytes    integer not null);

    CREATE TABLE IF NOT EXISTS Backup_Files(
        ID               integer not null
            constraint Backup_Files_ID_pk
                primary key autoincrement,
        Run_ID           integer not null
            constraint Backup_Files_Backup_Runs_ID_fk
                references Backup_Runs,
        Source_Path      TEXT    not null,
        Destination_Path TEXT    not null,
        Modified_Secs    integer not null,
        Modified_Nanos   integer not null,
        File_Size        integer not null,
        Hash             TEXT);

    CREATE INDEX IF NOT EXISTS Backup_Files_Run_ID_index
            on Backup_Files (Run_ID);

    CREATE INDEX IF NOT EXISTS Backup_Files_Source_Path_index
            on Backup_Files (Source_Path);

    COMMIT;";

        self.conn
            .execute_batch(setup_queries)
            .map_err(|cause| BackupError::DatabaseQuery {
                operation: "setup_database".to_string(),
                cause,
            })
    }
}

fn duration_from_columns(secs: i64, nanos: i64) -> Duration {
    Duration::new(secs.max(0) as u64, nanos.clamp(0, 999_999_999) as u32)
}

impl StateStore for SqliteStateStore {
    fn load(&mut self) -> Result<StateMap> {
        let to_query_error = |cause| BackupError::DatabaseQuery {
            operation: "load_state".to_string(),
            cause,
        };

        let mut query = self
            .conn
            .prepare(
                "SELECT File_Path, Modified_Secs, Modified_Nanos, File_Size, Hash
                FROM Source_State",
            )
            .map_err(to_query_error)?;

        let rows = query
            .query_map([], |row| {
                let file_size: i64 = row.get(3)?;
                Ok((
                    row.get::<_, String>(0)?,
                    FileState::new(
                        duration_from_columns(row.get(1)?, row.get(2)?),
                        file_size.max(0) as u64,
                    )
                    .with_hash(row.get(4)?),
                ))
            })
            .map_err(to_query_error)?;

        let mut state = StateMap::new();
        for row in rows {
            let (path, file_state) = row.map_err(to_query_error)?;
            state.insert(path, file_state);
        }
        debug!("Loaded {} recorded files from {}", state.len(), self.db_file);
        Ok(state)
    }

    fn save(&mut self, state: &StateMap) -> Result<()> {
        let tx = self
            .conn
            .transaction()
            .map_err(|cause| BackupError::DatabaseQuery {
                operation: "save_state".to_string(),
                cause,
            })?;

        for (path, file_state) in state {
            tx.execute(
                "INSERT INTO Source_State (File_Path, Modified_Secs, Modified_Nanos, File_Size, Hash)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT (File_Path) DO UPDATE SET
                Modified_Secs=excluded.Modified_Secs,
                Modified_Nanos=excluded.Modified_Nanos,
                File_Size=excluded.File_Size,
                Hash=excluded.Hash;",
                (
                    path,
                    file_state.modified.as_secs() as i64,
                    i64::from(file_state.modified.subsec_nanos()),
                    file_state.size as i64,
                    &file_state.hash,
                ),
            )
            .map_err(|cause| BackupError::DatabaseInsert {
                table: "Source_State".to_string(),
                file: path.clone(),
                cause,
            })?;
        }

        tx.commit().map_err(|cause| BackupError::DatabaseQuery {
            operation: "save_state".to_string(),
            cause,
        })
    }

    fn record_backup(&mut self, record: &BackupRecord) -> Result<()> {
        let tx = self
            .conn
            .transaction()
            .map_err(|cause| BackupError::DatabaseQuery {
                operation: "record_backup".to_string(),
                cause,
            })?;

        tx.execute(
            "INSERT INTO Backup_Runs (Backup_Root, Directory_Name, File_Count, Total_Bytes)
                VALUES (?1, ?2, ?3, ?4)",
            (
                record.backup_root.to_string_lossy().into_owned(),
                &record.directory_name,
                record.files.len() as i64,
                record.total_bytes() as i64,
            ),
        )
        .map_err(|cause| BackupError::DatabaseInsert {
            table: "Backup_Runs".to_string(),
            file: record.directory_name.clone(),
            cause,
        })?;
        let run_id = tx.last_insert_rowid();

        for file in &record.files {
            tx.execute(
                "INSERT INTO Backup_Files (Run_ID, Source_Path, Destination_Path, Modified_Secs, Modified_Nanos, File_Size, Hash)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                (
                    run_id,
                    file.source.to_string_lossy().into_owned(),
                    file.destination.to_string_lossy().into_owned(),
                    file.state.modified.as_secs() as i64,
                    i64::from(file.state.modified.subsec_nanos()),
                    file.state.size as i64,
                    &file.state.hash,
                ),
            )
            .map_err(|cause| BackupError::DatabaseInsert {
                table: "Backup_Files".to_string(),
                file: file.source.display().to_string(),
                cause,
            })?;
        }

        tx.commit().map_err(|cause| BackupError::DatabaseQuery {
            operation: "record_backup".to_string(),
            cause,
        })
    }

    fn describe(&self) -> String {
        format!("SQLite state database {}", self.db_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::backed_up_file::BackedUpFile;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn run_count(store: &SqliteStateStore) -> i64 {
        store
            .conn
            .query_row("SELECT COUNT(*) FROM Backup_Runs", [], |row| row.get(0))
            .unwrap()
    }

    fn backups_of(store: &SqliteStateStore, source_path: &str) -> Vec<String> {
        let mut query = store
            .conn
            .prepare("SELECT Destination_Path FROM Backup_Files WHERE Source_Path=?1 ORDER BY ID")
            .unwrap();
        let rows = query.query_map([source_path], |row| row.get(0)).unwrap();
        rows.collect::<rusqlite::Result<Vec<String>>>().unwrap()
    }

    fn sample_state() -> StateMap {
        let mut state = StateMap::new();
        state.insert(
            "/saves/game.sav".to_string(),
            FileState::new(Duration::new(1_700_000_000, 987_654_321), 2048)
                .with_hash(Some("feed".to_string())),
        );
        state
    }

    #[test]
    fn test_setup_database_creates_schema() {
        let store = SqliteStateStore::open(":memory:").unwrap();
        for table in ["Source_State", "Backup_Runs", "Backup_Files"] {
            let result = store
                .conn
                .execute(&format!("SELECT 1 FROM {} WHERE 1=0", table), []);
            assert!(result.is_ok(), "missing table {}", table);
        }
    }

    #[test]
    fn test_save_then_load_state() {
        let mut store = SqliteStateStore::open(":memory:").unwrap();
        assert!(store.load().unwrap().is_empty());

        store.save(&sample_state()).unwrap();
        assert_eq!(store.load().unwrap(), sample_state());
    }

    #[test]
    fn test_save_upserts_existing_rows() {
        let mut store = SqliteStateStore::open(":memory:").unwrap();
        store.save(&sample_state()).unwrap();

        let mut updated = sample_state();
        updated.insert(
            "/saves/game.sav".to_string(),
            FileState::new(Duration::from_secs(1_800_000_000), 4096),
        );
        store.save(&updated).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded, updated);
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("state.db");
        let db = db.to_str().unwrap();

        SqliteStateStore::open(db).unwrap().save(&sample_state()).unwrap();
        assert_eq!(SqliteStateStore::open(db).unwrap().load().unwrap(), sample_state());
    }

    #[test]
    fn test_record_backup_keeps_history() {
        let mut store = SqliteStateStore::open(":memory:").unwrap();

        for directory_name in ["2024_01_01__000000", "2024_01_02__000000"] {
            let mut record =
                BackupRecord::new(directory_name.to_string(), PathBuf::from("/backups"));
            record.files.push(BackedUpFile {
                source: PathBuf::from("/saves/game.sav"),
                destination: PathBuf::from("/backups")
                    .join(directory_name)
                    .join("game.sav"),
                state: FileState::new(Duration::from_secs(10), 5),
            });
            store.record_backup(&record).unwrap();
        }

        assert_eq!(run_count(&store), 2);
        let copies = backups_of(&store, "/saves/game.sav");
        assert_eq!(copies.len(), 2);
        assert!(copies[0].contains("2024_01_01__000000"));
    }
}
