//! Projection of a status snapshot onto presentation state.
//!
//! [`project`] is pure: the tray icon, menu and tooltip are recomputed from
//! scratch for every new snapshot and never patched in place.

use std::collections::BTreeSet;
use std::fmt::Write;

use crate::action::ActionId;
use crate::status::{ConnectionState, StatusSnapshot};

/// Primary tray icon variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconVariant {
    Off,
    Idle,
    InCall,
    Muted,
    Sharing,
}

impl IconVariant {
    /// Tray colour as an RGB hex string.
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::Off => "#868e96",
            Self::Idle => "#3498db",
            Self::InCall => "#51cf66",
            Self::Muted => "#ff6b6b",
            Self::Sharing => "#f59f00",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "Daemon Off",
            Self::Idle => "Idle",
            Self::InCall => "In Call",
            Self::Muted => "Muted",
            Self::Sharing => "Sharing",
        }
    }
}

/// What the tray and menus should show for a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    pub icon: IconVariant,
    /// Secondary indicator for sharing while the primary icon shows mute
    pub sharing_badge: bool,
    pub enabled_actions: BTreeSet<ActionId>,
    pub tooltip: String,
}

impl UiState {
    #[must_use]
    pub fn is_enabled(&self, action: ActionId) -> bool {
        self.enabled_actions.contains(&action)
    }
}

/// Actions that do not depend on daemon or call state.
const ALWAYS_ENABLED: [ActionId; 6] = [
    ActionId::LoginStart,
    ActionId::LoginComplete,
    ActionId::Logout,
    ActionId::SettingsList,
    ActionId::SettingsSet,
    ActionId::Status,
];

/// Derive presentation state from a snapshot.
///
/// Precedence is daemon state, then call state, then mute, then sharing.
/// Defined for every flag combination, including ones the parser would clamp.
#[must_use]
pub fn project(snapshot: &StatusSnapshot) -> UiState {
    let mut enabled: BTreeSet<ActionId> = ALWAYS_ENABLED.into_iter().collect();

    let icon = if !snapshot.daemon_on {
        enabled.insert(ActionId::DaemonStart);
        IconVariant::Off
    } else if !snapshot.in_call {
        enabled.extend([
            ActionId::CallJoin,
            ActionId::CallStart,
            ActionId::DaemonStop,
            ActionId::DaemonDebugUi,
        ]);
        IconVariant::Idle
    } else {
        enabled.extend([ActionId::CallEnd, ActionId::DaemonStop, ActionId::DaemonDebugUi]);
        enabled.insert(if snapshot.muted { ActionId::MuteOff } else { ActionId::MuteOn });
        enabled.insert(if snapshot.sharing { ActionId::ShareEnd } else { ActionId::ShareStart });

        if snapshot.muted {
            IconVariant::Muted
        } else if snapshot.sharing {
            IconVariant::Sharing
        } else {
            IconVariant::InCall
        }
    };

    let sharing_badge = icon == IconVariant::Muted && snapshot.sharing;

    UiState { icon, sharing_badge, enabled_actions: enabled, tooltip: tooltip(icon, snapshot) }
}

fn tooltip(icon: IconVariant, snapshot: &StatusSnapshot) -> String {
    let mut text = format!("Tuple: {}", icon.label());
    if icon == IconVariant::Muted && snapshot.sharing {
        text.push_str(", sharing screen");
    }
    if snapshot.daemon_on && snapshot.connection != ConnectionState::Unknown {
        let _ = write!(text, " ({})", snapshot.connection.label());
    }
    if snapshot.logged_in == Some(false) {
        text.push_str(" - not logged in");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn snapshot(daemon_on: bool, in_call: bool, muted: bool, sharing: bool) -> StatusSnapshot {
        StatusSnapshot { daemon_on, in_call, muted, sharing, ..Default::default() }
    }

    #[test]
    fn test_daemon_off_only_offers_start() {
        let ui = project(&snapshot(false, true, true, true));

        assert_eq!(ui.icon, IconVariant::Off);
        assert!(ui.is_enabled(ActionId::DaemonStart));
        assert!(!ui.is_enabled(ActionId::DaemonStop));
        assert!(ActionId::ALL.iter().filter(|a| a.is_call_control()).all(|a| !ui.is_enabled(*a)));
        assert!(!ui.sharing_badge);
    }

    #[test]
    fn test_idle_offers_join_and_start() {
        let ui = project(&snapshot(true, false, false, false));

        assert_eq!(ui.icon, IconVariant::Idle);
        assert!(ui.is_enabled(ActionId::CallJoin));
        assert!(ui.is_enabled(ActionId::CallStart));
        assert!(ui.is_enabled(ActionId::DaemonStop));
        assert!(!ui.is_enabled(ActionId::DaemonStart));
        assert!(!ui.is_enabled(ActionId::MuteOn));
        assert!(!ui.is_enabled(ActionId::ShareStart));
    }

    #[test]
    fn test_mute_beats_sharing() {
        let ui = project(&snapshot(true, true, true, true));

        assert_eq!(ui.icon, IconVariant::Muted);
        assert!(ui.sharing_badge);
        assert!(ui.is_enabled(ActionId::MuteOff));
        assert!(ui.is_enabled(ActionId::ShareEnd));
        assert!(!ui.is_enabled(ActionId::MuteOn));
        assert!(ui.tooltip.contains("sharing"));
    }

    #[test]
    fn test_sharing_and_plain_call() {
        let sharing = project(&snapshot(true, true, false, true));
        assert_eq!(sharing.icon, IconVariant::Sharing);
        assert!(!sharing.sharing_badge);

        let call = project(&snapshot(true, true, false, false));
        assert_eq!(call.icon, IconVariant::InCall);
        assert!(call.is_enabled(ActionId::CallEnd));
        assert!(call.is_enabled(ActionId::MuteOn));
        assert!(call.is_enabled(ActionId::ShareStart));
        assert!(!call.is_enabled(ActionId::CallJoin));
    }

    #[test]
    fn test_tooltip_mentions_login_state() {
        let mut s = snapshot(false, false, false, false);
        s.logged_in = Some(false);
        assert_eq!(project(&s).tooltip, "Tuple: Daemon Off - not logged in");
    }

    #[test]
    fn test_tooltip_connection_only_when_known() {
        let mut s = snapshot(true, false, false, false);
        assert_eq!(project(&s).tooltip, "Tuple: Idle");

        s.connection = ConnectionState::Connected;
        assert_eq!(project(&s).tooltip, "Tuple: Idle (Connected)");
    }

    proptest! {
        #[test]
        fn prop_project_is_total_and_deterministic(
            daemon_on in any::<bool>(),
            in_call in any::<bool>(),
            muted in any::<bool>(),
            sharing in any::<bool>(),
            raw_text in ".*",
        ) {
            let s = StatusSnapshot { daemon_on, in_call, muted, sharing, raw_text, ..Default::default() };
            let first = project(&s);
            let second = project(&s);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.is_enabled(ActionId::DaemonStart), !daemon_on);
            prop_assert!(first.is_enabled(ActionId::Status));
        }
    }
}
