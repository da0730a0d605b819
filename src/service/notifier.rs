use crate::models::config::Config;
use crate::models::error::{BackupError, Result};
use crate::models::run_summary::RunSummary;
use log::{info, warn};
use std::process::Command;

/// Receives the summary of a finished run
pub trait Notifier {
    fn notify(&self, title: &str, message: &str) -> Result<()>;
}

/// Writes the summary to the log
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) -> Result<()> {
        info!("{}: {}", title, message);
        Ok(())
    }
}

/// Runs a user supplied program with the title and message appended as arguments,
/// e.g. `["notify-send", "--app-name=saves"]`
pub struct CommandNotifier {
    program: String,
    args: Vec<String>,
}

impl CommandNotifier {
    pub fn new(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(CommandNotifier {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl Notifier for CommandNotifier {
    fn notify(&self, title: &str, message: &str) -> Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(title)
            .arg(message)
            .status()
            .map_err(|cause| BackupError::Notification {
                command: self.program.clone(),
                cause,
            })?;

        if !status.success() {
            return Err(BackupError::Notification {
                command: self.program.clone(),
                cause: std::io::Error::other(format!("exited with {}", status)),
            });
        }
        Ok(())
    }
}

pub fn notifier_from_config(config: &Config) -> Box<dyn Notifier> {
    match config
        .notification_command
        .as_deref()
        .and_then(CommandNotifier::new)
    {
        Some(notifier) => Box::new(notifier),
        None => Box::new(LogNotifier),
    }
}

/// Reports a run that could not start or finish at all
pub fn send_failure(notifier: &dyn Notifier, message: &str) {
    if let Err(e) = notifier.notify("Save Backup - errors", message) {
        warn!("Failed to send notification: {}", e);
    }
}

/// Hands the summary to the notifier. A failing notifier never fails the run.
pub fn send_summary(notifier: &dyn Notifier, summary: &RunSummary) {
    if let Err(e) = notifier.notify(summary.title(), &summary.message()) {
        warn!("Failed to send notification: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::backup_record::BackupRecord;
    use std::cell::RefCell;
    use std::path::PathBuf;

    struct RecordingNotifier {
        sent: RefCell<Vec<(String, String)>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, title: &str, message: &str) -> Result<()> {
            self.sent
                .borrow_mut()
                .push((title.to_string(), message.to_string()));
            Ok(())
        }
    }

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn notify(&self, _title: &str, _message: &str) -> Result<()> {
            Err(BackupError::Notification {
                command: "toast".to_string(),
                cause: std::io::Error::other("no display"),
            })
        }
    }

    fn summary() -> RunSummary {
        RunSummary::new(BackupRecord::new(
            "2024_01_01__000000".to_string(),
            PathBuf::from("/backups"),
        ))
    }

    #[test]
    fn test_send_summary_passes_title_and_message() {
        let notifier = RecordingNotifier {
            sent: RefCell::new(Vec::new()),
        };
        send_summary(&notifier, &summary());

        assert_eq!(
            notifier.sent.into_inner(),
            vec![("Save Backup".to_string(), "No files backed up".to_string())]
        );
    }

    #[test]
    fn test_failing_notifier_is_not_fatal() {
        send_summary(&FailingNotifier, &summary());
    }

    #[test]
    fn test_send_failure_uses_error_title() {
        let notifier = RecordingNotifier {
            sent: RefCell::new(Vec::new()),
        };
        send_failure(&notifier, "Failed to load configuration: missing file");
        send_failure(&FailingNotifier, "ignored");

        assert_eq!(
            notifier.sent.into_inner(),
            vec![(
                "Save Backup - errors".to_string(),
                "Failed to load configuration: missing file".to_string()
            )]
        );
    }

    #[test]
    fn test_command_notifier_requires_program() {
        assert!(CommandNotifier::new(&[]).is_none());
        assert!(CommandNotifier::new(&["notify-send".to_string()]).is_some());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_notifier_reports_exit_status() {
        let ok = CommandNotifier::new(&["true".to_string()]).unwrap();
        assert!(ok.notify("title", "message").is_ok());

        let failing = CommandNotifier::new(&["false".to_string()]).unwrap();
        assert!(matches!(
            failing.notify("title", "message"),
            Err(BackupError::Notification { .. })
        ));
    }
}
