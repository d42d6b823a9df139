//! Status snapshots and the `tuple status` output contract.
//!
//! The CLI's status output is an external, loosely versioned format. All
//! knowledge of its shape lives in [`parse_status`]; callers only ever see a
//! [`StatusSnapshot`] or a [`ParseError`].

use serde_json::Value;
use tracing::debug;

use crate::error::ParseError;

/// The only status format version this parser understands.
pub const STATUS_FORMAT_VERSION: u32 = 1;

/// Connection state of the call service's signaling channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    Connected,
    Connecting,
    Synchronizing,
    Disconnected,
    #[default]
    Unknown,
}

impl ConnectionState {
    /// Parse a signaler state word as printed by the CLI.
    #[must_use]
    pub fn from_word(word: &str) -> Self {
        let word = word.split_whitespace().next().unwrap_or_default();
        match word.to_ascii_lowercase().as_str() {
            "connected" => Self::Connected,
            "connecting" => Self::Connecting,
            "synchronizing" | "syncing" => Self::Synchronizing,
            "disconnected" | "closed" => Self::Disconnected,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Connected => "Connected",
            Self::Connecting => "Connecting",
            Self::Synchronizing => "Synchronizing",
            Self::Disconnected => "Disconnected",
            Self::Unknown => "Unknown",
        }
    }
}

/// Point-in-time view of the call service, replaced wholesale on every
/// successful poll.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct StatusSnapshot {
    /// Background daemon is running
    pub daemon_on: bool,
    /// A call is active
    pub in_call: bool,
    /// Microphone is muted (only meaningful in a call)
    pub muted: bool,
    /// Screen is being shared (only meaningful in a call)
    pub sharing: bool,
    /// Text the snapshot was parsed from
    pub raw_text: String,
    /// Whether an auth token is saved, when reported
    pub logged_in: Option<bool>,
    /// Signaling connection state
    pub connection: ConnectionState,
    /// Personal call URL, when known
    pub personal_url: Option<String>,
}

impl StatusSnapshot {
    /// Compare the four status flags, ignoring raw text and details.
    #[must_use]
    pub fn same_status(&self, other: &Self) -> bool {
        self.daemon_on == other.daemon_on
            && self.in_call == other.in_call
            && self.muted == other.muted
            && self.sharing == other.sharing
    }

    /// Force the flags into a consistent combination.
    ///
    /// A call needs a running daemon, and mute/share need a call.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        if !self.daemon_on && self.in_call {
            debug!("Status reports a call without a daemon; clearing call flags");
            self.in_call = false;
        }
        if !self.in_call && (self.muted || self.sharing) {
            debug!(muted = self.muted, sharing = self.sharing, "Clearing mute/share outside a call");
            self.muted = false;
            self.sharing = false;
        }
        self
    }
}

#[derive(Default)]
struct Fields {
    version: Option<String>,
    daemon: Option<bool>,
    call: Option<bool>,
    muted: Option<bool>,
    sharing: Option<bool>,
    logged_in: Option<bool>,
    connection: Option<ConnectionState>,
    personal_url: Option<String>,
}

/// Parse the output of `tuple status` into a snapshot.
///
/// Accepts `key: value` / `key=value` lines or a JSON object with the same
/// keys. Unknown keys are ignored. Inconsistent flag combinations are clamped.
///
/// # Errors
/// Returns a [`ParseError`] when the text is empty, a required field is
/// missing, a value cannot be read, or the declared version is unsupported.
pub fn parse_status(text: &str) -> Result<StatusSnapshot, ParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    let fields = if trimmed.starts_with('{') {
        parse_json(trimmed)?
    } else {
        parse_lines(trimmed)?
    };

    if let Some(version) = &fields.version
        && version.parse::<u32>().ok() != Some(STATUS_FORMAT_VERSION)
    {
        return Err(ParseError::UnsupportedVersion(version.clone()));
    }

    let daemon_on = fields.daemon.ok_or(ParseError::MissingField("daemon"))?;
    let in_call = match (daemon_on, fields.call) {
        (_, Some(call)) => call,
        (true, None) => return Err(ParseError::MissingField("call")),
        (false, None) => false,
    };

    Ok(StatusSnapshot {
        daemon_on,
        in_call,
        muted: fields.muted.unwrap_or(false),
        sharing: fields.sharing.unwrap_or(false),
        raw_text: text.to_string(),
        logged_in: fields.logged_in,
        connection: fields.connection.unwrap_or_default(),
        personal_url: fields.personal_url,
    }
    .clamped())
}

fn parse_lines(text: &str) -> Result<Fields, ParseError> {
    let mut fields = Fields::default();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Whichever separator comes first splits; values may contain either.
        let Some(at) = line.find([':', '=']) else {
            return Err(ParseError::Malformed(line.to_string()));
        };
        let (key, value) = (&line[..at], &line[at + 1..]);
        apply_field(&mut fields, key, value.trim())?;
    }

    Ok(fields)
}

fn parse_json(text: &str) -> Result<Fields, ParseError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| ParseError::Malformed(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(ParseError::Malformed(text.to_string()));
    };

    let mut fields = Fields::default();
    for (key, value) in &map {
        let text = match value {
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.clone(),
            Value::Null => continue,
            other => {
                debug!(key = %key, value = %other, "Ignoring nested status value");
                continue;
            }
        };
        apply_field(&mut fields, key, &text)?;
    }

    Ok(fields)
}

fn apply_field(fields: &mut Fields, key: &str, value: &str) -> Result<(), ParseError> {
    match key.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "version" | "format" => fields.version = Some(value.to_string()),
        "daemon" => fields.daemon = Some(parse_flag("daemon", value)?),
        "call" | "in_call" => fields.call = Some(parse_flag("call", value)?),
        "muted" | "mute" => fields.muted = Some(parse_flag("muted", value)?),
        "sharing" | "share" => fields.sharing = Some(parse_flag("sharing", value)?),
        "logged_in" | "login" => fields.logged_in = Some(parse_flag("logged_in", value)?),
        "connection" | "signaler" => fields.connection = Some(ConnectionState::from_word(value)),
        "personal_url" | "url" => {
            fields.personal_url = (!value.is_empty()).then(|| value.to_string());
        }
        other => debug!(key = other, "Ignoring unknown status field"),
    }
    Ok(())
}

/// Reads the first word, so annotations like `on (pid: 12)` are accepted.
fn parse_flag(field: &'static str, value: &str) -> Result<bool, ParseError> {
    let word = value.split_whitespace().next().unwrap_or_default();
    match word.to_ascii_lowercase().as_str() {
        "yes" | "true" | "on" | "1" | "running" | "active" | "started" => Ok(true),
        "no" | "false" | "off" | "0" | "stopped" | "inactive" | "none" => Ok(false),
        _ => Err(ParseError::InvalidValue { field, value: value.to_string() }),
    }
}
