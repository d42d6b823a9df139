//! Status derived from the `tuple` daemon log.
//!
//! Older CLI builds have no `status` subcommand; the daemon log is then the
//! only record of what happened. The log is replayed from the top and the
//! last event of each kind wins.

use crate::error::ParseError;
use crate::status::{ConnectionState, StatusSnapshot};

/// Relevant log lines kept as the snapshot's raw text.
const RAW_TAIL_LINES: usize = 32;

/// Replay a daemon log into a status snapshot.
///
/// # Errors
/// Returns [`ParseError::Empty`] when the log has no content.
pub fn parse_log(text: &str) -> Result<StatusSnapshot, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let mut snapshot = StatusSnapshot::default();
    let mut relevant: Vec<&str> = Vec::new();

    for line in text.lines() {
        if apply_line(&mut snapshot, line) {
            relevant.push(line.trim_end());
        }
    }

    let start = relevant.len().saturating_sub(RAW_TAIL_LINES);
    snapshot.raw_text = relevant[start..].join("\n");
    Ok(snapshot.clamped())
}

/// Fold one log line into the snapshot. Returns whether the line mattered.
fn apply_line(snapshot: &mut StatusSnapshot, line: &str) -> bool {
    if line.contains("saved auth token: yes") {
        snapshot.logged_in = Some(true);
        return true;
    }
    if line.contains("saved auth token: no") {
        snapshot.logged_in = Some(false);
        return true;
    }
    if line.contains("daemon loop started") {
        snapshot.daemon_on = true;
        return true;
    }
    if let Some((_, change)) = line.split_once("signaler state changed:") {
        if let Some((_, to)) = change.split_once("->") {
            snapshot.connection = ConnectionState::from_word(to);
        }
        return true;
    }
    if line.contains("personal URL slug") && line.contains("added") {
        if let Some(slug) = line.split('\'').nth(1).filter(|s| !s.is_empty()) {
            snapshot.personal_url = Some(format!("https://tuple.app/{slug}"));
        }
        return true;
    }
    if let Some((_, rest)) = line.split_once("command '") {
        let command = rest.split('\'').next().unwrap_or_default();
        apply_command(snapshot, command);
        return true;
    }
    false
}

fn apply_command(snapshot: &mut StatusSnapshot, command: &str) {
    match command {
        "new" | "join" => {
            snapshot.in_call = true;
            snapshot.muted = false;
            snapshot.sharing = false;
        }
        "end" => {
            snapshot.in_call = false;
            snapshot.muted = false;
            snapshot.sharing = false;
        }
        "mute" => snapshot.muted = true,
        "unmute" => snapshot.muted = false,
        "share" => snapshot.sharing = true,
        "unshare" => snapshot.sharing = false,
        "off" => {
            snapshot.daemon_on = false;
            snapshot.in_call = false;
            snapshot.connection = ConnectionState::Disconnected;
        }
        _ => {}
    }
}
