//! Single-flight gate for user-issued commands.
//!
//! At most one user command runs at a time. A second submission while one is
//! in flight is rejected with [`ExecError::Busy`] rather than queued, so a
//! double-clicked toggle never replays stale intent.
//!
//! The gate is owned by the UI thread. Completion is delivered through the
//! callback passed to [`SingleFlightGate::submit`]; the owner hands the
//! [`CommandId`] back via [`SingleFlightGate::finish`] once it has received
//! it, which reopens the gate.

use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use tuple_ui_core::CommandRequest;

use crate::error::{ExecError, ExecResult};
use crate::runner::{CommandResult, CommandRunner};

/// Identifier handed out for each accepted command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId(u64);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Delivered exactly once per accepted command.
#[derive(Debug)]
pub struct Completion {
    pub id: CommandId,
    pub request: CommandRequest,
    pub outcome: ExecResult<CommandResult>,
}

struct InFlight {
    id: CommandId,
    task: JoinHandle<()>,
}

/// Rejects new commands while one is running.
pub struct SingleFlightGate {
    runner: Arc<CommandRunner>,
    runtime: Handle,
    next_id: u64,
    in_flight: Option<InFlight>,
}

impl fmt::Debug for SingleFlightGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleFlightGate")
            .field("in_flight", &self.in_flight.as_ref().map(|c| c.id))
            .finish_non_exhaustive()
    }
}

impl SingleFlightGate {
    /// Create a gate that runs commands on `runtime`.
    #[must_use]
    pub fn new(runner: Arc<CommandRunner>, runtime: Handle) -> Self {
        Self { runner, runtime, next_id: 0, in_flight: None }
    }

    /// Start `request` unless another command is in flight.
    ///
    /// Returns immediately. `on_complete` runs on a runtime worker when the
    /// process finishes; it should only forward the completion to the owner.
    ///
    /// # Errors
    /// Returns [`ExecError::Busy`] if a command is already running. The
    /// running command is unaffected.
    pub fn submit<F>(&mut self, request: CommandRequest, on_complete: F) -> ExecResult<CommandId>
    where
        F: FnOnce(Completion) + Send + 'static,
    {
        if let Some(current) = &self.in_flight {
            debug!(running = %current.id, rejected = %request, "Gate busy, rejecting command");
            return Err(ExecError::Busy);
        }

        self.next_id += 1;
        let id = CommandId(self.next_id);
        let runner = Arc::clone(&self.runner);

        info!(%id, command = %request, "Starting command");
        let task = self.runtime.spawn(async move {
            let outcome = runner.run(&request).await;
            on_complete(Completion { id, request, outcome });
        });

        self.in_flight = Some(InFlight { id, task });
        Ok(id)
    }

    /// Reopen the gate after the completion for `id` has been received.
    pub fn finish(&mut self, id: CommandId) {
        let current = self.in_flight.as_ref().map(|c| c.id);
        debug_assert_eq!(current, Some(id), "completion does not match the in-flight command");

        if current == Some(id) {
            self.in_flight = None;
        } else {
            error!(%id, ?current, "Ignoring completion for a command that is not in flight");
        }
    }

    /// Abort the in-flight command, terminating its process.
    ///
    /// No completion is delivered for a cancelled command.
    pub fn cancel(&mut self) -> Option<CommandId> {
        let current = self.in_flight.take()?;
        warn!(id = %current.id, "Cancelling in-flight command");
        current.task.abort();
        Some(current.id)
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    #[must_use]
    pub fn in_flight(&self) -> Option<CommandId> {
        self.in_flight.as_ref().map(|c| c.id)
    }
}

impl Drop for SingleFlightGate {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::testing::{calls, fake_cli};
    use assert_matches::assert_matches;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tuple_ui_core::Action;

    type Rx = mpsc::UnboundedReceiver<Completion>;
    type Tx = mpsc::UnboundedSender<Completion>;

    fn gate() -> (SingleFlightGate, Tx, Rx) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SingleFlightGate::new(Arc::new(CommandRunner::default()), Handle::current()), tx, rx)
    }

    fn forward(tx: Tx) -> impl FnOnce(Completion) + Send + 'static {
        move |completion| {
            let _ = tx.send(completion);
        }
    }

    fn sh(script: &str) -> CommandRequest {
        CommandRequest::new("sh", vec!["-c".into(), script.into()])
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_second_submit_is_rejected_while_busy() {
        let dir = tempfile::tempdir().unwrap();
        let cli = fake_cli(dir.path());
        let (mut gate, tx, mut rx) = gate();

        let slow = sh(&format!("sleep 0.3; sh {} on", dir.path().join("tuple.sh").display()));
        let first = gate.submit(slow, forward(tx.clone())).unwrap();

        let rejected = gate.submit(cli.request(&Action::MuteOn), forward(tx.clone()));
        assert_matches!(rejected, Err(ExecError::Busy));
        assert_eq!(gate.in_flight(), Some(first));

        let completion = rx.recv().await.unwrap();
        assert_eq!(completion.id, first);
        assert_eq!(completion.outcome.unwrap().stdout, "ok: on\n");

        // Only the first command ever reached the CLI.
        assert_eq!(calls(dir.path()), ["on"]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_finish_reopens_the_gate() {
        let (mut gate, tx, mut rx) = gate();

        let id = gate.submit(sh("echo one"), forward(tx.clone())).unwrap();
        let completion = rx.recv().await.unwrap();
        assert!(gate.is_busy(), "gate stays closed until the owner finishes");

        gate.finish(completion.id);
        assert!(!gate.is_busy());

        let next = gate.submit(sh("echo two"), forward(tx)).unwrap();
        assert_ne!(next, id);
        assert_eq!(rx.recv().await.unwrap().outcome.unwrap().stdout, "two\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failures_are_delivered_as_completions() {
        let (mut gate, tx, mut rx) = gate();

        let request = CommandRequest::new("/nonexistent/tuple-cli", vec!["on".into()]);
        gate.submit(request, forward(tx)).unwrap();

        let completion = rx.recv().await.unwrap();
        assert_matches!(completion.outcome, Err(ExecError::Launch { .. }));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_cancel_terminates_the_process() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("finished");
        let (mut gate, tx, mut rx) = gate();

        let script = format!("sleep 1; touch {}", marker.display());
        let id = gate.submit(sh(&script), forward(tx)).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(gate.cancel(), Some(id));
        assert!(!gate.is_busy());

        // The callback was dropped with the task, closing the channel.
        assert!(rx.recv().await.is_none());
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists(), "cancelled process kept running");
    }
}
