mod models;
mod repo;
mod service;
mod utils;

use crate::models::config::setup_config;
use crate::models::dry_run_mode::DryRunMode;
use crate::repo::open_state_store;
use crate::service::notifier::{notifier_from_config, send_failure, send_summary, LogNotifier};
use crate::service::runner::run_backup;
use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Parser;
use log::{debug, error, info};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "RustySaveBackup")]
#[command(about = "Backs up modified save-game files into timestamped folders", long_about = None)]
struct Cli {
    #[arg(
        short = 'c',
        long = "config",
        default_value = "config.json",
        env = "RUSTYSAVEBACKUP_CONFIG"
    )]
    config_file: String,

    #[arg(
        short = 'l',
        long = "log-level",
        default_value = "info",
        env = "LOG_LEVEL"
    )]
    log_level: String,

    /// Append logs to <dir>/backup_YYYY_MM.log instead of stderr
    #[arg(long = "log-dir", env = "RUSTYSAVEBACKUP_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    #[arg(short = 'v', long = "validate-only")]
    validate_only: bool,

    #[arg(short = 'd', long = "dry-run", conflicts_with = "dry_run_full")]
    dry_run: bool,

    #[arg(short = 'f', long = "dry-run-full", conflicts_with = "dry_run")]
    dry_run_full: bool,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_logging(&args)?;

    info!("RustySaveBackup starting...");

    // Strip any surrounding quotes from config file path
    let config_file_path = args
        .config_file
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    let config = match setup_config(config_file_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            // Without a config there is no notification_command to use
            send_failure(&LogNotifier, &format!("Failed to load configuration: {}", e));
            return Err(e).context("Failed to load configuration");
        }
    };
    debug!("Loaded config: {:?}", &config);

    if args.validate_only {
        info!("Configuration is valid. Exiting (--validate-only mode).");
        return Ok(());
    }

    let dry_run_mode = if args.dry_run_full {
        info!("Running in DRY RUN FULL mode - will simulate all checks including hashing");
        DryRunMode::Full
    } else if args.dry_run {
        info!("Running in DRY RUN QUICK mode - will show what would be backed up (skips hashing)");
        DryRunMode::Quick
    } else {
        DryRunMode::None
    };

    let notifier = notifier_from_config(&config);

    let mut store =
        open_state_store(&config.state_file).context("Failed to open state store")?;

    let summary = match run_backup(
        &config,
        store.as_mut(),
        dry_run_mode,
        Local::now(),
        !args.quiet,
    ) {
        Ok(summary) => summary,
        Err(e) => {
            error!("Backup failed: {}", e);
            if config.notifications {
                send_failure(notifier.as_ref(), &format!("Backup failed: {}", e));
            }
            return Err(e).context("Backup run failed");
        }
    };

    if config.notifications {
        send_summary(notifier.as_ref(), &summary);
    }

    if summary.has_failures() {
        for failed in &summary.failed {
            error!("{}: {}", failed.path.display(), failed.reason);
        }
        bail!("{} file(s) could not be backed up", summary.failed.len());
    }

    Ok(())
}

fn init_logging(args: &Cli) -> Result<()> {
    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    };

    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(log_level).format_timestamp_secs();

    if let Some(log_dir) = &args.log_dir {
        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
        let log_path = log_dir.join(format!("backup_{}.log", Local::now().format("%Y_%m")));
        let log_file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    }

    builder.init();
    Ok(())
}
