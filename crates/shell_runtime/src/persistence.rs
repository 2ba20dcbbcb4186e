//! Storage keys, broadcast topics, and wire messages shared across windows.
//!
//! Keys and topics are part of the durable external interface: existing
//! profiles carry data under these names, so they never change casually.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shell_host::{load_json_with, save_json_with, BroadcastBus, KeyValueStore};

use crate::model::{
    default_container_panels, ContainerId, ExtractedPanel, FloatingPanel, PanelData,
    PanelSizeCache, PanelsSnapshot,
};
use crate::theme::ThemeMode;

/// Storage key for the durable panel snapshot.
pub const PANELS_STORAGE_KEY: &str = "wpea-spa-panels";
/// Storage key for the per-window layout state.
pub const LAYOUT_STORAGE_KEY: &str = "wpea-spa-layout";
/// Storage key for the theme mode, stored as a bare string (not JSON).
pub const THEME_STORAGE_KEY: &str = "wpea-theme-mode";
/// Storage key for persisted UI preferences.
pub const UI_STORAGE_KEY: &str = "wpea-spa-ui";

/// Broadcast topic carrying [`PanelsSyncMessage`] values.
pub const PANELS_SYNC_TOPIC: &str = "wpea-spa-panels-sync";
/// Broadcast topic carrying [`ThemeSyncMessage`] values.
pub const THEME_SYNC_TOPIC: &str = "wpea-theme";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
/// Message published on [`PANELS_SYNC_TOPIC`] after each local panel mutation.
pub enum PanelsSyncMessage {
    /// Whole-snapshot update; receivers adopt it wholesale.
    #[serde(rename = "state-update")]
    StateUpdate {
        /// The publisher's durable state after the mutation.
        state: PanelsWireState,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Durable panel state as it travels on the bus.
///
/// Unlike the stored [`PanelsSnapshot`], the wire payload carries no drag
/// fields at all. Missing fields merge over defaults the same way.
pub struct PanelsWireState {
    /// Ordered panel lists per container.
    #[serde(default = "default_container_panels")]
    pub panels: BTreeMap<ContainerId, Vec<PanelData>>,
    /// Detached panels with free positions.
    #[serde(default)]
    pub floating_panels: Vec<FloatingPanel>,
    /// Panels moved to separate windows.
    #[serde(default)]
    pub extracted_panels: Vec<ExtractedPanel>,
    /// Last known floating geometry per panel id.
    #[serde(default)]
    pub panel_sizes: BTreeMap<String, PanelSizeCache>,
}

impl From<PanelsSnapshot> for PanelsWireState {
    fn from(snapshot: PanelsSnapshot) -> Self {
        Self {
            panels: snapshot.panels,
            floating_panels: snapshot.floating_panels,
            extracted_panels: snapshot.extracted_panels,
            panel_sizes: snapshot.panel_sizes,
        }
    }
}

impl From<PanelsWireState> for PanelsSnapshot {
    fn from(wire: PanelsWireState) -> Self {
        Self {
            panels: wire.panels,
            floating_panels: wire.floating_panels,
            extracted_panels: wire.extracted_panels,
            panel_sizes: wire.panel_sizes,
            dragging_panel: None,
            drag_source: None,
            drag_offset: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
/// Message published on [`THEME_SYNC_TOPIC`] after a local theme change.
pub enum ThemeSyncMessage {
    /// The publisher switched to `mode`.
    #[serde(rename = "theme-change")]
    ThemeChange {
        /// The newly selected mode.
        mode: ThemeMode,
    },
}

/// Saves a panel snapshot; failures are logged, in-memory state stays authoritative.
pub(crate) fn persist_panels<S: KeyValueStore + ?Sized>(store: &S, snapshot: &PanelsSnapshot) {
    if let Err(err) = save_json_with(store, PANELS_STORAGE_KEY, snapshot) {
        log::warn!("failed to persist panel state: {err}");
    }
}

/// Publishes a panel snapshot to other windows; best effort.
pub(crate) fn broadcast_panels<B: BroadcastBus + ?Sized>(bus: &B, snapshot: &PanelsSnapshot) {
    let message = PanelsSyncMessage::StateUpdate {
        state: snapshot.clone().into(),
    };
    match serde_json::to_string(&message) {
        Ok(raw) => bus.publish(PANELS_SYNC_TOPIC, &raw),
        Err(err) => log::warn!("failed to encode panel sync message: {err}"),
    }
}

/// Loads the persisted panel snapshot, if any; malformed data reads as absent.
pub(crate) fn load_panels<S: KeyValueStore + ?Sized>(store: &S) -> Option<PanelsSnapshot> {
    load_json_with(store, PANELS_STORAGE_KEY)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn panel_sync_messages_use_the_state_update_tag() {
        let message = PanelsSyncMessage::StateUpdate {
            state: PanelsSnapshot::default().into(),
        };
        let raw = serde_json::to_string(&message).expect("encode");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("decode");
        assert_eq!(value["type"], "state-update");
        assert!(value["state"]["panels"].is_object());

        let decoded: PanelsSyncMessage = serde_json::from_str(&raw).expect("round trip");
        assert_eq!(decoded, message);
    }

    #[test]
    fn wire_payload_carries_only_the_durable_panel_fields() {
        let message = PanelsSyncMessage::StateUpdate {
            state: PanelsSnapshot::default().into(),
        };
        let value = serde_json::to_value(&message).expect("encode");
        let state = value["state"].as_object().expect("state object");

        let mut keys: Vec<&str> = state.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["extractedPanels", "floatingPanels", "panelSizes", "panels"]
        );
    }

    #[test]
    fn wire_payload_converts_to_a_snapshot_with_nulled_drag_fields() {
        let wire: PanelsWireState = PanelsSnapshot::default().into();
        let snapshot = PanelsSnapshot::from(wire);
        assert_eq!(snapshot.dragging_panel, None);
        assert_eq!(snapshot.drag_source, None);
        assert_eq!(snapshot.drag_offset, None);
        assert_eq!(snapshot, PanelsSnapshot::default());
    }

    #[test]
    fn theme_sync_messages_use_the_theme_change_tag() {
        let raw = serde_json::to_string(&ThemeSyncMessage::ThemeChange {
            mode: ThemeMode::Dark,
        })
        .expect("encode");
        assert_eq!(raw, r#"{"type":"theme-change","mode":"dark"}"#);
    }

    #[test]
    fn unknown_message_tags_fail_to_decode() {
        let decoded: Result<PanelsSyncMessage, _> =
            serde_json::from_str(r#"{"type":"clear","state":{}}"#);
        assert!(decoded.is_err());
    }
}
