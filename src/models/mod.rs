pub mod backed_up_file;
pub mod backup_record;
pub mod config;
pub mod config_validator;
pub mod dry_run_mode;
pub mod error;
pub mod file_state;
pub mod run_summary;
pub mod source_entry;
