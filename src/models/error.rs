use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Failed to read config file '{path}': {cause}")]
    ConfigRead { path: PathBuf, cause: io::Error },

    #[error("Failed to parse config file '{path}': {cause}")]
    ConfigParse {
        path: PathBuf,
        cause: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Source does not exist: '{path}'")]
    MissingSource { path: PathBuf },

    #[error("Failed to get metadata for '{path}': {cause}")]
    MetadataError { path: PathBuf, cause: io::Error },

    #[error("File modification time is invalid for '{path}': {cause}")]
    ModificationTimeError {
        path: PathBuf,
        cause: std::time::SystemTimeError,
    },

    #[error("Failed to hash file '{path}': {cause}")]
    HashError { path: PathBuf, cause: io::Error },

    #[error("Failed to copy file from '{from}' to '{to}': {cause}")]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        cause: io::Error,
    },

    #[error("Failed to read directory entry: {0}")]
    DirectoryRead(String),

    #[error("Failed to read state file '{path}': {cause}")]
    StateRead { path: PathBuf, cause: io::Error },

    #[error("Failed to parse state file '{path}': {cause}")]
    StateParse {
        path: PathBuf,
        cause: serde_json::Error,
    },

    #[error("Failed to write state file '{path}': {cause}")]
    StateWrite { path: PathBuf, cause: io::Error },

    #[error("Failed to open or create database file '{path}': {cause}")]
    DatabaseConnection {
        path: String,
        cause: rusqlite::Error,
    },

    #[error("Database query failed for '{operation}': {cause}")]
    DatabaseQuery {
        operation: String,
        cause: rusqlite::Error,
    },

    #[error("Failed to insert into {table} for {file}: {cause}")]
    DatabaseInsert {
        table: String,
        file: String,
        cause: rusqlite::Error,
    },

    #[error("Failed to run notification command '{command}': {cause}")]
    Notification { command: String, cause: io::Error },
}

pub type Result<T> = std::result::Result<T, BackupError>;
