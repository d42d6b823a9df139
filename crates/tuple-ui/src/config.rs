//! Front-end configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use tuple_ui_core::{Action, CliInvocation};
use tuple_ui_exec::StatusSource;

/// Environment variable overriding `cli.program`.
pub const CLI_ENV: &str = "TUPLE_UI_CLI";

/// Front-end configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// How to launch the tuple CLI
    #[serde(default)]
    pub cli: CliConfig,
    /// Status polling
    #[serde(default)]
    pub status: StatusConfig,
    /// Console pane
    #[serde(default)]
    pub console: ConsoleConfig,
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Executable name or path
    #[serde(default = "default_program")]
    pub program: PathBuf,
    /// Arguments placed before every subcommand
    #[serde(default)]
    pub args: Vec<String>,
    /// Seconds before a command is killed
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self { program: default_program(), args: Vec::new(), timeout_secs: default_timeout_secs() }
    }
}

fn default_program() -> PathBuf {
    PathBuf::from("tuple")
}

fn default_timeout_secs() -> u64 {
    30
}

/// Where status comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// `tuple status`
    #[default]
    Command,
    /// The daemon log file
    LogFile,
}

/// Status polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    #[serde(default)]
    pub source: SourceKind,
    /// Milliseconds between polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Milliseconds to wait after a command before re-reading status
    #[serde(default = "default_refresh_delay_ms")]
    pub refresh_delay_ms: u64,
    /// Daemon log path for the `log_file` source (defaults to the CLI's)
    pub log_path: Option<PathBuf>,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Command,
            poll_interval_ms: default_poll_interval_ms(),
            refresh_delay_ms: default_refresh_delay_ms(),
            log_path: None,
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_refresh_delay_ms() -> u64 {
    500
}

/// Console pane settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Entries kept before the oldest are dropped
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self { capacity: default_capacity() }
    }
}

fn default_capacity() -> usize {
    500
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    /// Returns an error if the document is not valid TOML for this schema or
    /// fails validation.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would stall polling or kill every command.
    ///
    /// # Errors
    /// Returns an error naming the offending setting.
    pub fn validate(&self) -> Result<()> {
        if self.cli.program.as_os_str().is_empty() {
            bail!("cli.program must not be empty");
        }
        if self.cli.timeout_secs == 0 {
            bail!("cli.timeout_secs must be greater than zero");
        }
        if self.status.poll_interval_ms == 0 {
            bail!("status.poll_interval_ms must be greater than zero");
        }
        if self.console.capacity == 0 {
            bail!("console.capacity must be greater than zero");
        }
        Ok(())
    }

    /// Invocation used for every CLI command.
    #[must_use]
    pub fn cli_invocation(&self) -> CliInvocation {
        CliInvocation::new(self.cli.program.clone())
            .with_leading_args(self.cli.args.clone())
            .with_timeout(self.command_timeout())
    }

    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.cli.timeout_secs)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.status.poll_interval_ms)
    }

    #[must_use]
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.status.refresh_delay_ms)
    }

    /// Resolve the configured status source.
    ///
    /// # Errors
    /// Returns an error if the log file source is selected and no log path
    /// can be determined.
    pub fn status_source(&self) -> Result<StatusSource> {
        match self.status.source {
            SourceKind::Command => {
                Ok(StatusSource::Command(self.cli_invocation().request(&Action::Status)))
            }
            SourceKind::LogFile => {
                let path = match &self.status.log_path {
                    Some(path) => expand_home(path),
                    None => default_log_path().context("Could not determine the tuple log path")?,
                };
                Ok(StatusSource::LogFile(path))
            }
        }
    }

    /// Apply environment overrides.
    pub fn apply_env(&mut self) {
        if let Some(program) = std::env::var_os(CLI_ENV).filter(|p| !p.is_empty()) {
            self.cli.program = PathBuf::from(program);
        }
    }
}

/// The CLI daemon's log: `$XDG_DATA_HOME/tuple/0/log.txt`.
fn default_log_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.data_dir().join("tuple/0/log.txt"))
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => BaseDirs::new()
            .map_or_else(|| path.to_path_buf(), |dirs| dirs.home_dir().join(rest)),
        Err(_) => path.to_path_buf(),
    }
}

/// Load configuration from file or defaults, then apply env overrides.
///
/// # Errors
/// Returns an error if the config file exists but cannot be read or parsed.
pub fn load_config() -> Result<Config> {
    let path = config_path()?;

    let mut config = if path.exists() {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {path:?}"))?;
        Config::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {path:?}"))?
    } else {
        Config::default()
    };

    config.apply_env();
    Ok(config)
}

/// Get the configuration file path.
///
/// # Errors
/// Returns an error if no home directory can be determined.
pub fn config_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("app", "tuple", "tuple-ui")
        .context("Could not determine config directory")?;
    Ok(dirs.config_dir().join("config.toml"))
}
