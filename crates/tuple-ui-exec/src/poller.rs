//! Background status polling.
//!
//! The poller runs on the runtime, independent of the single-flight gate:
//! status reads are side-effect free and may overlap a user command. Polls
//! never overlap each other.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use tuple_ui_core::CommandRequest;

use crate::error::ExecResult;
use crate::runner::{CommandResult, CommandRunner};

/// Where status is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusSource {
    /// Run the CLI's `status` subcommand
    Command(CommandRequest),
    /// Replay the CLI daemon's log file
    LogFile(PathBuf),
}

/// Raw result of one poll, parsed later by the reducer.
#[derive(Debug)]
pub enum PollReport {
    Command(ExecResult<CommandResult>),
    LogFile(ExecResult<String>),
}

/// Spawns the polling task.
pub struct StatusPoller;

impl StatusPoller {
    /// Start polling `source` every `interval`, beginning immediately.
    ///
    /// `deliver` is called on a runtime worker with each report.
    pub fn spawn<F>(
        runtime: &Handle,
        runner: Arc<CommandRunner>,
        source: StatusSource,
        interval: Duration,
        deliver: F,
    ) -> PollerHandle
    where
        F: Fn(PollReport) + Send + 'static,
    {
        let (refresh_tx, mut refresh_rx) = mpsc::unbounded_channel::<Duration>();

        info!(?source, ?interval, "Starting status poller");
        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let report = poll_once(&runner, &source).await;
                        deliver(report);
                    }
                    request = refresh_rx.recv() => match request {
                        Some(delay) => {
                            debug!(?delay, "Status refresh requested");
                            ticker.reset_after(delay);
                        }
                        None => break,
                    },
                }
            }
            debug!("Status poller stopped");
        });

        PollerHandle { refresh_tx, task }
    }
}

async fn poll_once(runner: &CommandRunner, source: &StatusSource) -> PollReport {
    match source {
        StatusSource::Command(request) => PollReport::Command(runner.run(request).await),
        StatusSource::LogFile(path) => PollReport::LogFile(
            tokio::fs::read(path)
                .await
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .map_err(Into::into),
        ),
    }
}

/// Controls a running poller. Dropping the handle stops polling.
#[derive(Debug)]
pub struct PollerHandle {
    refresh_tx: mpsc::UnboundedSender<Duration>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Poll again after `delay`; the regular interval restarts from there.
    pub fn refresh_after(&self, delay: Duration) {
        let _ = self.refresh_tx.send(delay);
    }

    /// Stop polling. An in-progress status command is terminated.
    pub fn shutdown(&self) {
        self.task.abort();
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::testing::{calls, fake_cli, seed_state};
    use assert_matches::assert_matches;
    use std::time::Instant;
    use tuple_ui_core::Action;

    fn collect() -> (impl Fn(PollReport) + Send + 'static, mpsc::UnboundedReceiver<PollReport>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            move |report| {
                let _ = tx.send(report);
            },
            rx,
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_polls_immediately_then_on_interval() {
        let dir = tempfile::tempdir().unwrap();
        let cli = fake_cli(dir.path());
        seed_state(dir.path(), "daemon=on\ncall=yes\nmuted=no\nsharing=no\n");
        let (deliver, mut rx) = collect();

        let started = Instant::now();
        let _handle = StatusPoller::spawn(
            &Handle::current(),
            Arc::new(CommandRunner::default()),
            StatusSource::Command(cli.request(&Action::Status)),
            Duration::from_millis(200),
            deliver,
        );

        let first = rx.recv().await.unwrap();
        assert_matches!(first, PollReport::Command(Ok(ref r)) if r.stdout.contains("call: yes"));
        assert!(started.elapsed() < Duration::from_millis(200));

        rx.recv().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert!(calls(dir.path()).iter().all(|c| c == "status"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_refresh_polls_ahead_of_interval() {
        let dir = tempfile::tempdir().unwrap();
        let cli = fake_cli(dir.path());
        let (deliver, mut rx) = collect();

        let handle = StatusPoller::spawn(
            &Handle::current(),
            Arc::new(CommandRunner::default()),
            StatusSource::Command(cli.request(&Action::Status)),
            Duration::from_secs(60),
            deliver,
        );
        rx.recv().await.unwrap();

        let requested = Instant::now();
        handle.refresh_after(Duration::from_millis(50));
        rx.recv().await.unwrap();
        assert!(requested.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reads_log_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("log.txt");
        std::fs::write(&log, "daemon loop started\n").unwrap();
        let (deliver, mut rx) = collect();

        let _handle = StatusPoller::spawn(
            &Handle::current(),
            Arc::new(CommandRunner::default()),
            StatusSource::LogFile(log),
            Duration::from_secs(60),
            deliver,
        );

        assert_matches!(rx.recv().await.unwrap(), PollReport::LogFile(Ok(text)) if text.contains("daemon loop"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_deliver_callback_need_not_be_sync() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let polls = std::cell::Cell::new(0_u32);
        let deliver = move |report: PollReport| {
            polls.set(polls.get() + 1);
            let _ = tx.send((polls.get(), report));
        };

        let _handle = StatusPoller::spawn(
            &Handle::current(),
            Arc::new(CommandRunner::default()),
            StatusSource::LogFile(PathBuf::from("/nonexistent/tuple/log.txt")),
            Duration::from_millis(20),
            deliver,
        );

        assert_matches!(rx.recv().await.unwrap(), (1, PollReport::LogFile(Err(_))));
        assert_matches!(rx.recv().await.unwrap(), (2, _));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_dropping_handle_stops_polling() {
        let (deliver, mut rx) = collect();
        let handle = StatusPoller::spawn(
            &Handle::current(),
            Arc::new(CommandRunner::default()),
            StatusSource::LogFile(PathBuf::from("/nonexistent/tuple/log.txt")),
            Duration::from_millis(20),
            deliver,
        );
        assert_matches!(rx.recv().await.unwrap(), PollReport::LogFile(Err(_)));

        drop(handle);
        // The deliver closure is dropped with the task, closing the channel.
        while rx.recv().await.is_some() {}
    }
}
