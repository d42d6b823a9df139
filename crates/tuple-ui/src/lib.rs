//! Tuple UI - tray/console front-end for the `tuple` CLI.
//!
//! The main thread is the UI thread: it owns every piece of mutable state and
//! processes [`UiEvent`]s one at a time. Commands and status polls run on a
//! tokio runtime and only ever send events back.

pub mod app;
pub mod config;
pub mod console;
pub mod controller;
pub mod input;
pub mod presenter;
pub mod signals;

pub use app::Application;
pub use config::Config;
pub use controller::{Controller, EventSender, UiEvent};
pub use presenter::{Presenter, TerminalPresenter, TrayView};
