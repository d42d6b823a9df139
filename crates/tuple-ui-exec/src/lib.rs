//! Tuple UI Exec - runs the external `tuple` CLI without blocking the UI.
//!
//! The [`CommandRunner`] launches one process and captures its output, the
//! [`SingleFlightGate`] keeps user commands from overlapping, and the
//! [`StatusPoller`] / [`StatusReducer`] pair turns periodic `status` output
//! into snapshot changes.

pub mod error;
pub mod gate;
pub mod poller;
pub mod reducer;
pub mod runner;

pub use error::{ExecError, ExecResult};
pub use gate::{CommandId, Completion, SingleFlightGate};
pub use poller::{PollReport, PollerHandle, StatusPoller, StatusSource};
pub use reducer::{Reduction, StaleReason, StatusReducer};
pub use runner::{CommandResult, CommandRunner, DEFAULT_TIMEOUT};
