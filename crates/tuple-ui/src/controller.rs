//! UI-thread controller.
//!
//! Owns the gate, the reducer, the console and the current [`UiState`]. Every
//! background result arrives as a [`UiEvent`] and is applied here, one event
//! at a time, so no state is shared with the runtime.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tuple_ui_core::{Action, CliInvocation, Error, UiState, project};
use tuple_ui_exec::{
    Completion, CommandRunner, ExecError, PollReport, PollerHandle, Reduction, SingleFlightGate,
    StatusPoller, StatusReducer, StatusSource,
};

use crate::config::Config;
use crate::console::{ConsoleLog, EntryKind};
use crate::input::{HELP, InputError, UiCommand};
use crate::presenter::{Presenter, TrayView};

/// Shown when a command is submitted while another is running.
pub const BUSY_MESSAGE: &str = "A command is already running. Please wait for it to complete.";

/// Everything the UI thread reacts to.
#[derive(Debug)]
pub enum UiEvent {
    /// A parsed console command
    Input(UiCommand),
    /// A console line that could not be parsed
    InputRejected(InputError),
    /// Stdin reached end of file
    InputClosed,
    /// A user command finished
    Completed(Completion),
    /// A status poll finished
    Polled(PollReport),
    /// A termination signal arrived
    Shutdown,
}

/// Cloneable handle for posting events to the UI thread.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl EventSender {
    /// Create a sender and the receiver the UI loop drains.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Post an event.
    ///
    /// # Errors
    /// Returns [`EventLoopClosed`] once the UI loop has exited; the event is
    /// dropped.
    pub fn send(&self, event: UiEvent) -> Result<(), EventLoopClosed> {
        self.tx.send(event).map_err(|_| EventLoopClosed)
    }
}

/// The UI loop is no longer receiving events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("UI event loop has exited")]
pub struct EventLoopClosed;

/// Applies events to front-end state and drives a [`Presenter`].
pub struct Controller<P: Presenter> {
    cli: CliInvocation,
    runner: Arc<CommandRunner>,
    runtime: Handle,
    events: EventSender,
    gate: SingleFlightGate,
    poller: Option<PollerHandle>,
    reducer: StatusReducer,
    ui: Option<UiState>,
    console: ConsoleLog,
    presenter: P,
    refresh_delay: Duration,
}

impl<P: Presenter> Controller<P> {
    #[must_use]
    pub fn new(config: &Config, runtime: Handle, events: EventSender, presenter: P) -> Self {
        let runner = Arc::new(CommandRunner::new(config.command_timeout()));
        Self {
            cli: config.cli_invocation(),
            gate: SingleFlightGate::new(Arc::clone(&runner), runtime.clone()),
            runner,
            runtime,
            events,
            poller: None,
            reducer: StatusReducer::new(),
            ui: None,
            console: ConsoleLog::new(config.console.capacity),
            presenter,
            refresh_delay: config.refresh_delay(),
        }
    }

    /// Draw the initial state and begin polling `source`.
    pub fn start(&mut self, source: StatusSource, interval: Duration) {
        self.render();

        let events = self.events.clone();
        let poller = StatusPoller::spawn(
            &self.runtime,
            Arc::clone(&self.runner),
            source,
            interval,
            move |report| {
                let _ = events.send(UiEvent::Polled(report));
            },
        );
        self.poller = Some(poller);
    }

    /// Apply one event. Returns `Break` when the front-end should exit.
    pub fn handle(&mut self, event: UiEvent) -> ControlFlow<()> {
        match event {
            UiEvent::Input(command) => return self.handle_command(command),
            UiEvent::InputRejected(e) => self.log(EntryKind::Notice, e.to_string()),
            UiEvent::InputClosed => debug!("No more console input, tray keeps running"),
            UiEvent::Completed(completion) => self.on_completion(completion),
            UiEvent::Polled(report) => self.on_poll(report),
            UiEvent::Shutdown => {
                info!("Shutdown requested");
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn handle_command(&mut self, command: UiCommand) -> ControlFlow<()> {
        match command {
            UiCommand::Run(action) => self.run_action(action),
            UiCommand::Toggle(toggle) => {
                let action = toggle.resolve(self.reducer.snapshot().map(AsRef::as_ref));
                self.run_action(action);
            }
            UiCommand::CopyUrl => self.copy_url(),
            UiCommand::ClearConsole => {
                self.console.clear();
                self.presenter.clear_console();
                self.render();
            }
            UiCommand::Help => self.log(EntryKind::Notice, HELP),
            UiCommand::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn check(&self, action: &Action) -> tuple_ui_core::Result<()> {
        action.validate()?;
        // Before the first snapshot nothing is known, so nothing is disabled.
        match &self.ui {
            Some(ui) if !ui.is_enabled(action.id()) => Err(Error::ActionDisabled(action.id())),
            _ => Ok(()),
        }
    }

    fn run_action(&mut self, action: Action) {
        if let Err(e) = self.check(&action) {
            self.log(EntryKind::Error, e.to_string());
            return;
        }

        if action == Action::Status {
            self.refresh_after(Duration::ZERO);
            return;
        }

        let request = self.cli.request(&action);
        let line = format!("$ {request}");
        let events = self.events.clone();
        let submitted = self.gate.submit(request, move |completion| {
            let _ = events.send(UiEvent::Completed(completion));
        });

        match submitted {
            Ok(id) => {
                debug!(%id, ?action, "Action submitted");
                self.log(EntryKind::Invocation, line);
                self.render();
            }
            Err(ExecError::Busy) => self.log(EntryKind::Notice, BUSY_MESSAGE),
            Err(e) => self.log(EntryKind::Error, e.to_string()),
        }
    }

    fn on_completion(&mut self, completion: Completion) {
        self.gate.finish(completion.id);

        match completion.outcome {
            Ok(result) => {
                let stdout = result.stdout.trim_end();
                let stderr = result.stderr.trim_end();
                // Everything a failed command printed is highlighted.
                let output_kind =
                    if result.success() { EntryKind::Output } else { EntryKind::Error };
                if !stdout.is_empty() {
                    self.log(output_kind, stdout.to_string());
                }
                if !result.success() {
                    let message = if stderr.is_empty() {
                        format!("Command exited with code {}", result.exit_code)
                    } else {
                        stderr.to_string()
                    };
                    self.log(EntryKind::Error, message);
                } else if !stderr.is_empty() {
                    self.log(EntryKind::Output, stderr.to_string());
                }
            }
            Err(e) => {
                warn!(id = %completion.id, error = %e, "Command failed");
                self.log(EntryKind::Error, e.to_string());
            }
        }

        // Pick up the effect of the command without waiting for the next tick.
        self.refresh_after(self.refresh_delay);
        self.render();
    }

    fn on_poll(&mut self, report: PollReport) {
        match self.reducer.apply(report) {
            Reduction::Changed(snapshot) => {
                self.ui = Some(project(&snapshot));
                self.render();
            }
            Reduction::Refreshed => self.render(),
            Reduction::Unchanged => {}
            Reduction::Stale { reason, first } => {
                if first {
                    self.log(EntryKind::Notice, format!("Status unavailable: {reason}"));
                    self.render();
                }
            }
        }
    }

    fn copy_url(&mut self) {
        let Some(url) = self.reducer.snapshot().and_then(|s| s.personal_url.clone()) else {
            self.log(EntryKind::Notice, "No personal URL known yet");
            return;
        };

        match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(url.clone())) {
            Ok(()) => self.log(EntryKind::Notice, format!("Copied {url} to the clipboard")),
            Err(e) => self.log(EntryKind::Error, format!("Could not copy to the clipboard: {e}")),
        }
    }

    fn refresh_after(&self, delay: Duration) {
        if let Some(poller) = &self.poller {
            poller.refresh_after(delay);
        }
    }

    fn log(&mut self, kind: EntryKind, text: impl Into<String>) {
        let entry = self.console.push(kind, text);
        self.presenter.append_console(entry);
    }

    fn render(&mut self) {
        let view = TrayView {
            ui: self.ui.as_ref(),
            snapshot: self.reducer.snapshot().map(AsRef::as_ref),
            stale: self.reducer.is_stale(),
            busy: self.gate.in_flight(),
        };
        self.presenter.render(&view);
    }

    /// Terminate the running command and stop polling.
    pub fn shutdown(&mut self) {
        if let Some(id) = self.gate.cancel() {
            info!(%id, "Terminated running command on shutdown");
        }
        if let Some(poller) = self.poller.take() {
            poller.shutdown();
        }
    }

    #[must_use]
    pub fn ui(&self) -> Option<&UiState> {
        self.ui.as_ref()
    }

    #[must_use]
    pub fn console(&self) -> &ConsoleLog {
        &self.console
    }

    #[must_use]
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }
}
