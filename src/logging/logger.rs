//! Structured logger with dry-run awareness and summary collection.
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Mutex;

use super::subscriber::{ACTION_TARGET, DRY_RUN_TARGET, STAGE_TARGET};
use super::types::{ActionEntry, ActionStatus, Log};
use super::utils::log_file_path;

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger with dry-run awareness and summary collection.
///
/// All messages are always written to a persistent log file at
/// `$XDG_CACHE_HOME/symlink-garden/<command>.log` (default
/// `~/.cache/symlink-garden/<command>.log`) with timestamps and ANSI codes
/// stripped, regardless of the verbose flag.
#[derive(Debug)]
pub struct Logger {
    actions: Mutex<Vec<ActionEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger.
    ///
    /// Stores the log file path for display in the run summary. The file
    /// itself is created by [`init_subscriber`](super::subscriber::init_subscriber).
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            actions: Mutex::new(Vec::new()),
            log_file: log_file_path(command),
        }
    }

    /// Return the log file path, if available.
    #[cfg(test)]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Return a clone of all recorded action entries (test-only).
    #[cfg(test)]
    pub(crate) fn action_entries(&self) -> Vec<ActionEntry> {
        self.actions.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a dry-run action message.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// Print `  <description> ... ` without a newline and send the
    /// description to the log file.
    #[allow(clippy::print_stdout)]
    pub fn begin_action(&self, description: &str) {
        tracing::info!(target: ACTION_TARGET, "{description}");
        print!("  {description} ... ");
        std::io::stdout().flush().ok();
    }

    /// Finish the line opened by [`begin_action`](Self::begin_action).
    #[allow(clippy::print_stdout)]
    pub fn end_action(&self, ok: bool) {
        if ok {
            println!("\x1b[32mdone\x1b[0m");
        } else {
            println!("\x1b[31mfailed!\x1b[0m");
        }
    }

    /// Record an action result for the summary.
    pub fn record_action(&self, description: &str, status: ActionStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.actions.lock() {
            guard.push(ActionEntry {
                description: description.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Return `true` if any recorded action has failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failure_count() > 0
    }

    /// Count the number of failed actions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.actions.lock().map_or(0, |guard| {
            guard
                .iter()
                .filter(|a| a.status == ActionStatus::Failed)
                .count()
        })
    }

    /// Print the summary of all recorded actions.
    #[allow(clippy::print_stdout)]
    pub fn print_summary(&self) {
        let actions = match self.actions.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => return,
        };
        if actions.is_empty() {
            return;
        }

        println!();
        self.stage("Summary");

        let mut applied = 0u32;
        let mut dry_run = 0u32;
        let mut failed = 0u32;
        let mut abandoned = 0u32;

        for action in &actions {
            let (icon, color) = match action.status {
                ActionStatus::Applied => {
                    applied += 1;
                    ("✓", "\x1b[32m")
                }
                ActionStatus::DryRun => {
                    dry_run += 1;
                    ("~", "\x1b[37m")
                }
                ActionStatus::Failed => {
                    failed += 1;
                    ("✗", "\x1b[31m")
                }
                ActionStatus::Abandoned => {
                    abandoned += 1;
                    ("○", "\x1b[33m")
                }
            };

            let suffix = action
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));

            self.info(&format!(
                "{color}{icon} {}{suffix}\x1b[0m",
                action.description
            ));
        }

        println!();
        let total = applied + dry_run + failed + abandoned;
        self.info(&format!(
            "{total} actions: \x1b[32m{applied} applied\x1b[0m, \x1b[37m{dry_run} dry-run\x1b[0m, \x1b[31m{failed} failed\x1b[0m, \x1b[33m{abandoned} not performed\x1b[0m"
        ));

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, dry_run, begin_action);

    fn end_action(&self, ok: bool) {
        self.end_action(ok);
    }

    fn record_action(&self, description: &str, status: ActionStatus, message: Option<&str>) {
        self.record_action(description, status, message);
    }
}
