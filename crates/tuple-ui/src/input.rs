//! Console input: menu words typed on stdin.

use std::io::BufRead;
use std::thread;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, info};
use tuple_ui_core::{Action, ActionId, Toggle};

use crate::controller::{EventSender, UiEvent};

/// Something the user asked the front-end to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    /// Run a CLI action
    Run(Action),
    /// Flip mute or share based on the current status
    Toggle(Toggle),
    /// Copy the personal call URL to the clipboard
    CopyUrl,
    /// Empty the console pane
    ClearConsole,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Word typed to trigger an action.
#[must_use]
pub fn command_word(id: ActionId) -> &'static str {
    match id {
        ActionId::LoginStart => "login",
        ActionId::LoginComplete => "login <code>",
        ActionId::Logout => "logout",
        ActionId::CallJoin => "join <url>",
        ActionId::CallStart => "new",
        ActionId::CallEnd => "end",
        ActionId::ShareStart => "share",
        ActionId::ShareEnd => "unshare",
        ActionId::MuteOn => "mute",
        ActionId::MuteOff => "unmute",
        ActionId::DaemonStart => "on",
        ActionId::DaemonStop => "off",
        ActionId::DaemonDebugUi => "debug-ui",
        ActionId::SettingsList => "settings",
        ActionId::SettingsSet => "set <key> <value>",
        ActionId::Status => "status",
    }
}

pub const HELP: &str = "\
Commands:
  on | off | debug-ui        start, stop or inspect the daemon
  new | join <url> | end     start, join or leave a call
  mute | unmute | m          mute control (m toggles)
  share | unshare | s        screen sharing (s toggles)
  login [code] | logout      authentication
  settings | set <k> <v>     CLI settings
  status | refresh           re-read status now
  copy                       copy your personal URL
  clear                      clear the console
  help | quit";

/// Parse one input line. Blank lines yield `None`.
///
/// # Errors
/// Returns [`InputError`] for unknown words and missing arguments.
pub fn parse_line(line: &str) -> Result<Option<UiCommand>, InputError> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match word.to_ascii_lowercase().as_str() {
        "on" => UiCommand::Run(Action::DaemonStart),
        "off" => UiCommand::Run(Action::DaemonStop),
        "debug-ui" | "debug" => UiCommand::Run(Action::DaemonDebugUi),
        "new" => UiCommand::Run(Action::CallStart),
        // A missing URL is left for action validation to report.
        "join" => UiCommand::Run(Action::CallJoin { url: rest.join(" ") }),
        "end" => UiCommand::Run(Action::CallEnd),
        "mute" => UiCommand::Run(Action::MuteOn),
        "unmute" => UiCommand::Run(Action::MuteOff),
        "m" => UiCommand::Toggle(Toggle::Mute),
        "share" => UiCommand::Run(Action::ShareStart),
        "unshare" => UiCommand::Run(Action::ShareEnd),
        "s" => UiCommand::Toggle(Toggle::Share),
        "login" => match rest.as_slice() {
            [] => UiCommand::Run(Action::LoginStart),
            [code] => UiCommand::Run(Action::LoginComplete { code: (*code).to_string() }),
            _ => return Err(InputError::Usage("login [code]")),
        },
        "logout" => UiCommand::Run(Action::Logout),
        "settings" => UiCommand::Run(Action::SettingsList),
        "set" => match rest.as_slice() {
            [key, value @ ..] if !value.is_empty() => UiCommand::Run(Action::SettingsSet {
                key: (*key).to_string(),
                value: value.join(" "),
            }),
            _ => return Err(InputError::Usage("set <key> <value>")),
        },
        "status" | "refresh" => UiCommand::Run(Action::Status),
        "copy" => UiCommand::CopyUrl,
        "clear" => UiCommand::ClearConsole,
        "help" | "?" => UiCommand::Help,
        "quit" | "exit" | "q" => UiCommand::Quit,
        _ => return Err(InputError::Unknown(word.to_string())),
    };
    Ok(Some(command))
}

/// Read stdin lines on a dedicated thread and forward them as events.
///
/// # Errors
/// Returns an error if the thread cannot be spawned.
pub fn spawn_stdin_reader(events: EventSender) -> Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("tuple-ui-input".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                let event = match parse_line(&line) {
                    Ok(Some(command)) => UiEvent::Input(command),
                    Ok(None) => continue,
                    Err(e) => UiEvent::InputRejected(e),
                };
                if events.send(event).is_err() {
                    debug!("UI loop gone, stopping input reader");
                    return;
                }
            }
            info!("Input closed");
            let _ = events.send(UiEvent::InputClosed);
        })
        .context("Failed to spawn input thread")
}
