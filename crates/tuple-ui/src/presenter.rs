//! Presentation surfaces.
//!
//! The controller only talks to a [`Presenter`]; the terminal implementation
//! renders the tray state as a status line followed by the enabled menu.

use std::io::{self, IsTerminal, Write};

use tracing::warn;
use tuple_ui_core::{ActionId, IconVariant, StatusSnapshot, UiState};
use tuple_ui_exec::CommandId;

use crate::console::{ConsoleEntry, EntryKind};
use crate::input::command_word;

/// Everything a surface needs to draw the tray.
#[derive(Debug, Clone, Copy)]
pub struct TrayView<'a> {
    /// `None` until the first successful poll
    pub ui: Option<&'a UiState>,
    pub snapshot: Option<&'a StatusSnapshot>,
    /// The last poll failed; `ui` is from an earlier snapshot
    pub stale: bool,
    /// Command currently holding the gate
    pub busy: Option<CommandId>,
}

/// A presentation surface (tray, terminal, test recorder).
pub trait Presenter {
    /// Redraw the tray icon, tooltip and menu.
    fn render(&mut self, view: &TrayView<'_>);

    /// Show one new console entry.
    fn append_console(&mut self, entry: &ConsoleEntry);

    /// Empty the console pane.
    fn clear_console(&mut self);
}

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";

fn icon_ansi(icon: IconVariant) -> &'static str {
    match icon {
        IconVariant::Off => "\x1b[90m",
        IconVariant::Idle => "\x1b[34m",
        IconVariant::InCall => "\x1b[32m",
        IconVariant::Muted => "\x1b[31m",
        IconVariant::Sharing => "\x1b[33m",
    }
}

/// Renders to a text stream, optionally with ANSI colours.
#[derive(Debug)]
pub struct TerminalPresenter<W: Write> {
    out: W,
    color: bool,
}

impl TerminalPresenter<io::Stdout> {
    /// Presenter on stdout, coloured when stdout is a terminal.
    #[must_use]
    pub fn stdout() -> Self {
        let out = io::stdout();
        let color = out.is_terminal();
        Self::new(out, color)
    }
}

impl<W: Write> TerminalPresenter<W> {
    #[must_use]
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, code: &'static str, text: &str) -> String {
        if self.color { format!("{code}{text}{RESET}") } else { text.to_string() }
    }

    fn write_view(&mut self, view: &TrayView<'_>) -> io::Result<()> {
        let mut line = match view.ui {
            Some(ui) => self.paint(icon_ansi(ui.icon), &format!("● {}", ui.tooltip)),
            None => self.paint(DIM, "○ Tuple: status unknown"),
        };
        if view.stale {
            line.push_str(&self.paint(DIM, " [stale]"));
        }
        if let Some(id) = view.busy {
            line.push_str(&self.paint(DIM, &format!(" [running {id}]")));
        }
        writeln!(self.out, "{line}")?;

        if let Some(url) = view.snapshot.and_then(|s| s.personal_url.as_deref()) {
            writeln!(self.out, "  URL: {url}")?;
        }

        let actions: Vec<&str> = ActionId::ALL
            .into_iter()
            .filter(|id| view.ui.is_none_or(|ui| ui.is_enabled(*id)))
            .map(command_word)
            .collect();
        writeln!(self.out, "  Actions: {}", actions.join(", "))?;
        self.out.flush()
    }

    fn write_entry(&mut self, entry: &ConsoleEntry) -> io::Result<()> {
        let text = entry.to_string();
        let text = text.trim_end();
        let text = match entry.kind {
            EntryKind::Error => self.paint(RED, text),
            EntryKind::Notice => self.paint(DIM, text),
            EntryKind::Invocation | EntryKind::Output => text.to_string(),
        };
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn render(&mut self, view: &TrayView<'_>) {
        if let Err(e) = self.write_view(view) {
            warn!(error = %e, "Failed to render tray state");
        }
    }

    fn append_console(&mut self, entry: &ConsoleEntry) {
        if let Err(e) = self.write_entry(entry) {
            warn!(error = %e, "Failed to write console entry");
        }
    }

    fn clear_console(&mut self) {
        let result = if self.color {
            write!(self.out, "\x1b[2J\x1b[H").and_then(|()| self.out.flush())
        } else {
            writeln!(self.out, "--- console cleared ---")
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to clear console");
        }
    }
}
