//! Core logging types: action entries, status, and the [`Log`] trait.

/// Outcome of one planned action, for summary reporting.
#[derive(Debug, Clone)]
pub struct ActionEntry {
    /// The action's description.
    pub description: String,
    /// What happened to it.
    pub status: ActionStatus,
    /// Optional detail message (e.g., the error that stopped it).
    pub message: Option<String>,
}

/// What happened to a planned action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    /// The action was applied.
    Applied,
    /// The action was only described (dry run).
    DryRun,
    /// The action was attempted and failed.
    Failed,
    /// The action was never attempted because an earlier one failed or the
    /// run was interrupted.
    Abandoned,
}

/// Abstraction over logging backends.
///
/// [`Logger`](super::logger::Logger) writes to the console and the log
/// file; tests substitute recorders so runner output can be asserted.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Announce an action that is about to be applied.
    fn begin_action(&self, description: &str);
    /// Mark the most recently announced action as done or failed.
    fn end_action(&self, ok: bool);
    /// Record an action result for the summary.
    fn record_action(&self, description: &str, status: ActionStatus, message: Option<&str>);
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn action_status_equality() {
        assert_eq!(ActionStatus::Applied, ActionStatus::Applied);
        assert_ne!(ActionStatus::Applied, ActionStatus::Failed);
        assert_ne!(ActionStatus::Abandoned, ActionStatus::DryRun);
    }

    #[test]
    fn action_entry_clone() {
        let entry = ActionEntry {
            description: "Delete weed at /g/x".to_string(),
            status: ActionStatus::Failed,
            message: Some("permission denied".to_string()),
        };
        let cloned = entry.clone();
        assert_eq!(cloned.description, entry.description);
        assert_eq!(cloned.status, entry.status);
        assert_eq!(cloned.message, entry.message);
    }
}
