//! Application wiring: runtime, event loop and shutdown.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::Config;
use crate::controller::{Controller, EventSender};
use crate::input::spawn_stdin_reader;
use crate::presenter::TerminalPresenter;
use crate::signals::setup_signal_handlers;

/// How long background tasks get to wind down on exit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// The Tuple UI application.
pub struct Application {
    config: Config,
}

impl Application {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run until quit is requested or a termination signal arrives.
    ///
    /// The calling thread becomes the UI thread; commands and polls run on a
    /// background tokio runtime.
    ///
    /// # Errors
    /// Returns an error if the runtime or input thread cannot be started, or
    /// the status source cannot be resolved.
    pub fn run(self) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("tuple-ui-worker")
            .enable_all()
            .build()
            .context("Failed to create tokio runtime")?;

        let source = self.config.status_source()?;
        let (events, mut rx) = EventSender::channel();

        setup_signal_handlers(runtime.handle(), &events);
        // Detached: it exits on EOF or once the event channel closes.
        spawn_stdin_reader(events.clone())?;

        let mut controller = Controller::new(
            &self.config,
            runtime.handle().clone(),
            events,
            TerminalPresenter::stdout(),
        );
        controller.start(source, self.config.poll_interval());
        info!("Tuple UI ready");

        while let Some(event) = rx.blocking_recv() {
            if controller.handle(event).is_break() {
                break;
            }
        }

        debug!("Shutting down");
        controller.shutdown();
        drop(controller);
        runtime.shutdown_timeout(SHUTDOWN_GRACE);
        info!("Tuple UI stopped");
        Ok(())
    }
}
