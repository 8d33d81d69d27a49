//! Plan execution: dry-run reporting and sequential application.
//!
//! [`execute`] applies a [`Plan`] in order and stops at the first failure;
//! applied actions are never rolled back.  Every action is recorded in the
//! [`Log`] so the summary can list what was applied, what failed and what
//! was abandoned.
use std::sync::atomic::{AtomicBool, Ordering};

use crate::actions::{Mutation as _, Plan};
use crate::error::RunError;
use crate::logging::{ActionStatus, Log};

/// Describe every action in `plan` without touching the filesystem.
pub fn dry_run(plan: &Plan, log: &dyn Log) {
    if plan.is_empty() {
        log.info("Nothing would be done");
        return;
    }
    log.stage("The following actions would be performed:");
    for description in plan.descriptions() {
        log.dry_run(&description);
        log.record_action(&description, ActionStatus::DryRun, None);
    }
}

/// Apply every action in `plan` in order.
///
/// When `verbose` is set each description is printed before the action is
/// applied and marked done or failed afterwards.  `cancel` is checked
/// before each action; once set, the remaining actions are abandoned.
///
/// # Errors
///
/// Returns [`RunError::ActionFailed`] for the first action that fails and
/// [`RunError::Cancelled`] if `cancel` was set before the plan finished.
pub fn execute(
    plan: &Plan,
    log: &dyn Log,
    verbose: bool,
    cancel: &AtomicBool,
) -> Result<(), RunError> {
    if plan.is_empty() {
        if verbose {
            log.info("Nothing to do");
        }
        return Ok(());
    }

    let actions: Vec<_> = plan.iter().collect();
    for (index, action) in actions.iter().enumerate() {
        let description = action.description();

        if cancel.load(Ordering::SeqCst) {
            let abandoned = remaining(&actions, index);
            log.warn(&format!(
                "interrupted; {} action(s) not performed",
                abandoned.len()
            ));
            abandon(log, &abandoned);
            return Err(RunError::Cancelled { abandoned });
        }

        if verbose {
            log.begin_action(&description);
        } else {
            log.debug(&description);
        }

        match action.apply() {
            Ok(()) => {
                if verbose {
                    log.end_action(true);
                }
                log.record_action(&description, ActionStatus::Applied, None);
            }
            Err(source) => {
                if verbose {
                    log.end_action(false);
                }
                log.error(&format!("Action failed: {description}: {source:#}"));
                log.record_action(
                    &description,
                    ActionStatus::Failed,
                    Some(&format!("{source:#}")),
                );
                let abandoned = remaining(&actions, index + 1);
                if !abandoned.is_empty() {
                    log.warn("The following actions were not performed:");
                    for desc in &abandoned {
                        log.warn(&format!("  {desc}"));
                    }
                }
                abandon(log, &abandoned);
                return Err(RunError::ActionFailed {
                    action: description,
                    abandoned,
                    source,
                });
            }
        }
    }
    Ok(())
}

/// Descriptions of `actions[from..]`.
fn remaining(actions: &[&crate::actions::Action], from: usize) -> Vec<String> {
    actions
        .iter()
        .skip(from)
        .map(|a| a.description())
        .collect()
}

fn abandon(log: &dyn Log, descriptions: &[String]) {
    for desc in descriptions {
        log.record_action(desc, ActionStatus::Abandoned, None);
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::actions::{DeleteWeed, WriteManifest};
    use std::sync::Mutex;

    /// Records every call so runner output can be asserted.
    #[derive(Debug, Default)]
    struct RecordingLog {
        lines: Mutex<Vec<String>>,
        entries: Mutex<Vec<(String, ActionStatus)>>,
    }

    impl RecordingLog {
        fn push(&self, kind: &str, msg: &str) {
            self.lines.lock().unwrap().push(format!("{kind}: {msg}"));
        }

        fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }

        fn statuses(&self) -> Vec<ActionStatus> {
            self.entries
                .lock()
                .unwrap()
                .iter()
                .map(|(_, s)| *s)
                .collect()
        }
    }

    impl Log for RecordingLog {
        fn stage(&self, msg: &str) {
            self.push("stage", msg);
        }
        fn info(&self, msg: &str) {
            self.push("info", msg);
        }
        fn debug(&self, msg: &str) {
            self.push("debug", msg);
        }
        fn warn(&self, msg: &str) {
            self.push("warn", msg);
        }
        fn error(&self, msg: &str) {
            self.push("error", msg);
        }
        fn dry_run(&self, msg: &str) {
            self.push("dry_run", msg);
        }
        fn begin_action(&self, description: &str) {
            self.push("begin", description);
        }
        fn end_action(&self, ok: bool) {
            self.push("end", if ok { "done" } else { "failed!" });
        }
        fn record_action(&self, description: &str, status: ActionStatus, _message: Option<&str>) {
            self.entries
                .lock()
                .unwrap()
                .push((description.to_string(), status));
        }
    }

    fn manifest_write(dir: &std::path::Path) -> WriteManifest {
        WriteManifest::new(dir.join(".symlink-garden/manifest.json"), "{}\n".into())
    }

    #[test]
    fn dry_run_of_empty_plan_says_nothing_would_be_done() {
        let log = RecordingLog::default();
        dry_run(&Plan::new(), &log);
        assert_eq!(log.lines(), vec!["info: Nothing would be done"]);
    }

    #[test]
    fn dry_run_lists_descriptions_without_applying() {
        let tmp = tempfile::tempdir().unwrap();
        let mut plan = Plan::new();
        plan.push(manifest_write(tmp.path()));
        let log = RecordingLog::default();

        dry_run(&plan, &log);

        assert_eq!(
            log.lines(),
            vec![
                "stage: The following actions would be performed:",
                "dry_run: Commit changes to the garden's manifest",
            ]
        );
        assert_eq!(log.statuses(), vec![ActionStatus::DryRun]);
        assert!(!tmp.path().join(".symlink-garden").exists());
    }

    #[test]
    fn execute_empty_plan_verbose_reports_nothing_to_do() {
        let log = RecordingLog::default();
        execute(&Plan::new(), &log, true, &AtomicBool::new(false)).unwrap();
        assert_eq!(log.lines(), vec!["info: Nothing to do"]);
    }

    #[test]
    fn execute_verbose_marks_each_action_done() {
        let tmp = tempfile::tempdir().unwrap();
        let mut plan = Plan::new();
        plan.push(manifest_write(tmp.path()));
        let log = RecordingLog::default();

        execute(&plan, &log, true, &AtomicBool::new(false)).unwrap();

        assert_eq!(
            log.lines(),
            vec![
                "begin: Commit changes to the garden's manifest",
                "end: done",
            ]
        );
        assert_eq!(log.statuses(), vec![ActionStatus::Applied]);
        assert!(tmp.path().join(".symlink-garden/manifest.json").exists());
    }

    #[test]
    fn execute_stops_at_first_failure_and_abandons_the_rest() {
        let tmp = tempfile::tempdir().unwrap();
        let mut plan = Plan::new();
        plan.push(DeleteWeed::new(tmp.path().join("missing")));
        plan.push(manifest_write(tmp.path()));
        let log = RecordingLog::default();

        let err = execute(&plan, &log, false, &AtomicBool::new(false)).unwrap_err();

        let RunError::ActionFailed {
            action, abandoned, ..
        } = err
        else {
            panic!("expected an action failure");
        };
        assert!(action.starts_with("Delete weed at "));
        assert_eq!(abandoned, vec!["Commit changes to the garden's manifest"]);
        assert_eq!(
            log.statuses(),
            vec![ActionStatus::Failed, ActionStatus::Abandoned]
        );
        assert!(!tmp.path().join(".symlink-garden").exists());
        assert!(
            log.lines()
                .iter()
                .any(|l| l == "warn:   Commit changes to the garden's manifest")
        );
    }

    #[test]
    fn execute_cancelled_before_start_applies_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let mut plan = Plan::new();
        plan.push(manifest_write(tmp.path()));
        let log = RecordingLog::default();

        let err = execute(&plan, &log, false, &AtomicBool::new(true)).unwrap_err();

        assert!(matches!(err, RunError::Cancelled { ref abandoned } if abandoned.len() == 1));
        assert_eq!(log.statuses(), vec![ActionStatus::Abandoned]);
        assert!(!tmp.path().join(".symlink-garden").exists());
    }
}
