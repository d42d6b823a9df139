//! User actions and the CLI argument table.
//!
//! Every control the front-end offers maps to exactly one invocation of the
//! external `tuple` executable. [`Action::args`] is the only place that knows
//! the subcommand spelling.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::status::StatusSnapshot;

/// Identifier of an action, independent of its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionId {
    LoginStart,
    LoginComplete,
    Logout,
    CallJoin,
    CallStart,
    CallEnd,
    ShareStart,
    ShareEnd,
    MuteOn,
    MuteOff,
    DaemonStart,
    DaemonStop,
    DaemonDebugUi,
    SettingsList,
    SettingsSet,
    Status,
}

impl ActionId {
    /// All action identifiers, in menu order.
    pub const ALL: [Self; 16] = [
        Self::DaemonStart,
        Self::CallJoin,
        Self::CallStart,
        Self::CallEnd,
        Self::MuteOn,
        Self::MuteOff,
        Self::ShareStart,
        Self::ShareEnd,
        Self::DaemonStop,
        Self::DaemonDebugUi,
        Self::LoginStart,
        Self::LoginComplete,
        Self::Logout,
        Self::SettingsList,
        Self::SettingsSet,
        Self::Status,
    ];

    /// Human-readable menu label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::LoginStart => "Log In",
            Self::LoginComplete => "Complete Login",
            Self::Logout => "Log Out",
            Self::CallJoin => "Join Call",
            Self::CallStart => "New Call",
            Self::CallEnd => "End Call",
            Self::ShareStart => "Share Screen",
            Self::ShareEnd => "Unshare Screen",
            Self::MuteOn => "Mute",
            Self::MuteOff => "Unmute",
            Self::DaemonStart => "Start Daemon",
            Self::DaemonStop => "Stop Daemon",
            Self::DaemonDebugUi => "Debug UI",
            Self::SettingsList => "Settings",
            Self::SettingsSet => "Change Setting",
            Self::Status => "Refresh Status",
        }
    }

    /// Whether this action controls the call itself (as opposed to account,
    /// settings or daemon management).
    #[must_use]
    pub fn is_call_control(self) -> bool {
        matches!(
            self,
            Self::CallJoin
                | Self::CallStart
                | Self::CallEnd
                | Self::ShareStart
                | Self::ShareEnd
                | Self::MuteOn
                | Self::MuteOff
        )
    }
}

/// A concrete action, with whatever parameters the CLI needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    LoginStart,
    LoginComplete { code: String },
    Logout,
    CallJoin { url: String },
    CallStart,
    CallEnd,
    ShareStart,
    ShareEnd,
    MuteOn,
    MuteOff,
    DaemonStart,
    DaemonStop,
    DaemonDebugUi,
    SettingsList,
    SettingsSet { key: String, value: String },
    Status,
}

impl Action {
    /// The parameter-free identifier of this action.
    #[must_use]
    pub fn id(&self) -> ActionId {
        match self {
            Self::LoginStart => ActionId::LoginStart,
            Self::LoginComplete { .. } => ActionId::LoginComplete,
            Self::Logout => ActionId::Logout,
            Self::CallJoin { .. } => ActionId::CallJoin,
            Self::CallStart => ActionId::CallStart,
            Self::CallEnd => ActionId::CallEnd,
            Self::ShareStart => ActionId::ShareStart,
            Self::ShareEnd => ActionId::ShareEnd,
            Self::MuteOn => ActionId::MuteOn,
            Self::MuteOff => ActionId::MuteOff,
            Self::DaemonStart => ActionId::DaemonStart,
            Self::DaemonStop => ActionId::DaemonStop,
            Self::DaemonDebugUi => ActionId::DaemonDebugUi,
            Self::SettingsList => ActionId::SettingsList,
            Self::SettingsSet { .. } => ActionId::SettingsSet,
            Self::Status => ActionId::Status,
        }
    }

    /// Arguments passed to the `tuple` executable for this action.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        let fixed: &[&str] = match self {
            Self::LoginComplete { code } => return vec!["login".into(), code.trim().into()],
            Self::CallJoin { url } => return vec!["join".into(), url.trim().into()],
            Self::SettingsSet { key, value } => {
                return vec!["settings".into(), key.trim().into(), value.clone()];
            }
            Self::LoginStart => &["login"],
            Self::Logout => &["logout"],
            Self::CallStart => &["new"],
            Self::CallEnd => &["end"],
            Self::ShareStart => &["share"],
            Self::ShareEnd => &["unshare"],
            Self::MuteOn => &["mute"],
            Self::MuteOff => &["unmute"],
            Self::DaemonStart => &["on"],
            Self::DaemonStop => &["off"],
            Self::DaemonDebugUi => &["debug-ui"],
            Self::SettingsList => &["settings"],
            Self::Status => &["status"],
        };
        fixed.iter().map(|s| (*s).to_string()).collect()
    }

    /// Check that required parameters are present.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] when a URL, login code or setting
    /// key is blank.
    pub fn validate(&self) -> Result<()> {
        let blank = match self {
            Self::CallJoin { url } => url.trim().is_empty().then_some("call URL is required"),
            Self::LoginComplete { code } => {
                code.trim().is_empty().then_some("login code is required")
            }
            Self::SettingsSet { key, .. } => {
                key.trim().is_empty().then_some("setting key is required")
            }
            _ => None,
        };

        match blank {
            Some(reason) => Err(Error::InvalidArgument { action: self.id(), reason: reason.into() }),
            None => Ok(()),
        }
    }
}

/// Two-state controls whose concrete action depends on the current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Toggle {
    Mute,
    Share,
}

impl Toggle {
    /// Resolve the toggle against the latest snapshot.
    ///
    /// Without a snapshot the toggle turns the feature on.
    #[must_use]
    pub fn resolve(self, snapshot: Option<&StatusSnapshot>) -> Action {
        match self {
            Self::Mute if snapshot.is_some_and(|s| s.muted) => Action::MuteOff,
            Self::Mute => Action::MuteOn,
            Self::Share if snapshot.is_some_and(|s| s.sharing) => Action::ShareEnd,
            Self::Share => Action::ShareStart,
        }
    }
}

/// How the external CLI is launched: the executable, any leading arguments
/// (for wrappers such as `flatpak run`), and the per-command deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliInvocation {
    program: PathBuf,
    leading_args: Vec<String>,
    timeout: Option<Duration>,
}

impl CliInvocation {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), leading_args: Vec::new(), timeout: None }
    }

    #[must_use]
    pub fn with_leading_args(mut self, args: Vec<String>) -> Self {
        self.leading_args = args;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    /// Build the request that runs `action`.
    #[must_use]
    pub fn request(&self, action: &Action) -> CommandRequest {
        let mut args = self.leading_args.clone();
        args.extend(action.args());
        let request = CommandRequest::new(self.program.clone(), args);
        match self.timeout {
            Some(timeout) => request.with_timeout(timeout),
            None => request,
        }
    }
}

/// One invocation of an external executable. Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandRequest {
    /// Create a request without an explicit timeout.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self { program: program.into(), args, timeout: None }
    }

    /// Set a deadline after which the process is killed.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl fmt::Display for CommandRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {arg:?}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}
