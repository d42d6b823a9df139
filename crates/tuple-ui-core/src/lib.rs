//! Tuple UI Core - domain types shared by the execution engine and the front-end.
//!
//! This crate knows how to turn user intent into arguments for the external
//! `tuple` CLI, how to read the CLI's status output, and how to project a
//! status snapshot onto what the tray and menus should show. It performs no I/O.

pub mod action;
pub mod error;
pub mod logfile;
pub mod projector;
pub mod status;

pub use action::{Action, ActionId, CliInvocation, CommandRequest, Toggle};
pub use error::{Error, ParseError, Result};
pub use logfile::parse_log;
pub use projector::{IconVariant, UiState, project};
pub use status::{ConnectionState, StatusSnapshot, parse_status};
