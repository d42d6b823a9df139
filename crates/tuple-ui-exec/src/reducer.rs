//! Status reducer: folds poll reports into the last known snapshot.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};
use tuple_ui_core::{ParseError, StatusSnapshot, parse_log, parse_status};

use crate::error::ExecError;
use crate::poller::PollReport;

/// Why a poll did not produce a fresh snapshot.
#[derive(Debug, Error)]
pub enum StaleReason {
    #[error("unreadable status output: {0}")]
    Parse(#[from] ParseError),

    #[error("status read failed: {0}")]
    Exec(#[from] ExecError),

    #[error("status command exited with code {exit_code}: {stderr}")]
    DomainFailure { exit_code: i32, stderr: String },
}

/// What a poll report did to the reducer's state.
#[derive(Debug)]
pub enum Reduction {
    /// The four status flags differ from the previous snapshot
    Changed(Arc<StatusSnapshot>),
    /// Same status as before, but the stale indicator was cleared
    Refreshed,
    /// Same status as before
    Unchanged,
    /// The report was unusable; the previous snapshot is kept
    Stale {
        reason: StaleReason,
        /// Whether this report turned a fresh status stale
        first: bool,
    },
}

/// Single owner of the last known [`StatusSnapshot`].
#[derive(Debug, Default)]
pub struct StatusReducer {
    current: Option<Arc<StatusSnapshot>>,
    stale: bool,
}

impl StatusReducer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one poll report into the current state.
    pub fn apply(&mut self, report: PollReport) -> Reduction {
        match read_snapshot(report) {
            Ok(snapshot) => self.replace(snapshot),
            Err(reason) => {
                let first = !self.stale;
                self.stale = true;
                if first {
                    warn!(%reason, "Status is stale, keeping last snapshot");
                } else {
                    debug!(%reason, "Status still stale");
                }
                Reduction::Stale { reason, first }
            }
        }
    }

    fn replace(&mut self, snapshot: StatusSnapshot) -> Reduction {
        let was_stale = std::mem::replace(&mut self.stale, false);
        let changed = self.current.as_ref().is_none_or(|prev| !prev.same_status(&snapshot));

        self.current = Some(Arc::new(snapshot));

        match &self.current {
            Some(snapshot) if changed => {
                debug!(
                    daemon_on = snapshot.daemon_on,
                    in_call = snapshot.in_call,
                    muted = snapshot.muted,
                    sharing = snapshot.sharing,
                    "Status changed"
                );
                Reduction::Changed(Arc::clone(snapshot))
            }
            _ if was_stale => Reduction::Refreshed,
            _ => Reduction::Unchanged,
        }
    }

    /// Last successfully parsed snapshot, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<&Arc<StatusSnapshot>> {
        self.current.as_ref()
    }

    /// Whether the most recent poll failed.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.stale
    }
}

fn read_snapshot(report: PollReport) -> Result<StatusSnapshot, StaleReason> {
    match report {
        PollReport::Command(outcome) => {
            let result = outcome?;
            if !result.success() && result.stdout.trim().is_empty() {
                return Err(StaleReason::DomainFailure {
                    exit_code: result.exit_code,
                    stderr: result.stderr.trim().to_string(),
                });
            }
            Ok(parse_status(&result.stdout)?)
        }
        PollReport::LogFile(outcome) => Ok(parse_log(&outcome?)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::CommandResult;
    use assert_matches::assert_matches;
    use std::time::Duration;

    fn status(stdout: &str) -> PollReport {
        PollReport::Command(Ok(CommandResult {
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
            duration: Duration::from_millis(5),
        }))
    }

    const IDLE: &str = "daemon: on\ncall: no\n";
    const MUTED: &str = "daemon: on\ncall: yes\nmuted: yes\n";

    #[test]
    fn test_first_snapshot_is_a_change() {
        let mut reducer = StatusReducer::new();
        assert_matches!(reducer.apply(status(IDLE)), Reduction::Changed(s) if s.daemon_on && !s.in_call);
        assert!(!reducer.is_stale());
    }

    #[test]
    fn test_identical_snapshots_change_once() {
        let mut reducer = StatusReducer::new();
        let changes = [status(IDLE), status(IDLE), status("# again\ndaemon: on\ncall: no")]
            .into_iter()
            .map(|report| reducer.apply(report))
            .filter(|r| matches!(r, Reduction::Changed(_)))
            .count();
        assert_eq!(changes, 1);
    }

    #[test]
    fn test_details_replace_snapshot_without_change_event() {
        let mut reducer = StatusReducer::new();
        reducer.apply(status(IDLE));
        let with_url = format!("{IDLE}personal_url: https://tuple.app/ada\n");

        assert_matches!(reducer.apply(status(&with_url)), Reduction::Unchanged);
        assert_eq!(
            reducer.snapshot().unwrap().personal_url.as_deref(),
            Some("https://tuple.app/ada")
        );
    }

    #[test]
    fn test_unparseable_status_keeps_previous_snapshot() {
        let mut reducer = StatusReducer::new();
        reducer.apply(status(MUTED));
        let before = Arc::clone(reducer.snapshot().unwrap());

        let reduction = reducer.apply(status("panic: runtime error\n\tgoroutine 1"));
        assert_matches!(reduction, Reduction::Stale { reason: StaleReason::Parse(_), first: true });
        assert!(reducer.is_stale());
        assert!(Arc::ptr_eq(reducer.snapshot().unwrap(), &before));

        let again = reducer.apply(status(""));
        assert_matches!(again, Reduction::Stale { reason: StaleReason::Parse(ParseError::Empty), first: false });
        assert_eq!(**reducer.snapshot().unwrap(), *before);
    }

    #[test]
    fn test_recovery_from_stale_is_reported() {
        let mut reducer = StatusReducer::new();
        reducer.apply(status(MUTED));
        reducer.apply(status("???"));

        assert_matches!(reducer.apply(status(MUTED)), Reduction::Refreshed);
        assert!(!reducer.is_stale());
    }

    #[test]
    fn test_exec_errors_and_domain_failures_are_stale() {
        let mut reducer = StatusReducer::new();

        let timeout = PollReport::Command(Err(ExecError::Timeout {
            program: "tuple".into(),
            timeout: Duration::from_secs(30),
        }));
        assert_matches!(reducer.apply(timeout), Reduction::Stale { reason: StaleReason::Exec(_), .. });
        assert!(reducer.snapshot().is_none());

        let failed = PollReport::Command(Ok(CommandResult {
            exit_code: 1,
            stdout: String::new(),
            stderr: "not logged in\n".into(),
            duration: Duration::ZERO,
        }));
        assert_matches!(
            reducer.apply(failed),
            Reduction::Stale { reason: StaleReason::DomainFailure { exit_code: 1, ref stderr }, .. } if stderr == "not logged in"
        );
    }

    #[test]
    fn test_non_zero_exit_with_status_output_is_parsed() {
        let mut reducer = StatusReducer::new();
        let report = PollReport::Command(Ok(CommandResult {
            exit_code: 3,
            stdout: "daemon: off\n".into(),
            stderr: "daemon is not running\n".into(),
            duration: Duration::ZERO,
        }));
        assert_matches!(reducer.apply(report), Reduction::Changed(s) if !s.daemon_on);
    }

    #[test]
    fn test_log_file_reports() {
        let mut reducer = StatusReducer::new();
        let report = PollReport::LogFile(Ok("x daemon loop started\nx command 'join'\n".into()));
        assert_matches!(reducer.apply(report), Reduction::Changed(s) if s.in_call);

        let missing = PollReport::LogFile(Err(ExecError::Io(std::io::Error::from(
            std::io::ErrorKind::NotFound,
        ))));
        assert_matches!(reducer.apply(missing), Reduction::Stale { first: true, .. });
        assert!(reducer.snapshot().unwrap().in_call);
    }
}
