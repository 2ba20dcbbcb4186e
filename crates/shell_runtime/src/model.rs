//! Panel data model, drag session, and the durable snapshot shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default width for a panel floated without cached geometry.
pub const DEFAULT_FLOATING_WIDTH: f64 = 300.0;
/// Default height for a panel floated without cached geometry.
pub const DEFAULT_FLOATING_HEIGHT: f64 = 200.0;
/// Default x position for a panel re-floated without cached geometry.
pub const DEFAULT_FLOATING_X: f64 = 100.0;
/// Default y position for a panel re-floated without cached geometry.
pub const DEFAULT_FLOATING_Y: f64 = 100.0;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
/// Fixed docking zones available to the shell.
///
/// The set is defined at startup; containers never change identity, only
/// contents.
pub enum ContainerId {
    /// Left side panel column.
    Left,
    /// Right side panel column.
    Right,
    /// Left section of the bottom strip.
    BottomLeft,
    /// Center section of the bottom strip.
    BottomCenter,
    /// Right section of the bottom strip.
    BottomRight,
}

impl ContainerId {
    /// Every container in a stable order.
    pub const ALL: [ContainerId; 5] = [
        Self::Left,
        Self::Right,
        Self::BottomLeft,
        Self::BottomCenter,
        Self::BottomRight,
    ];

    /// Returns the stable string id used in storage and wire payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::BottomLeft => "bottom-left",
            Self::BottomCenter => "bottom-center",
            Self::BottomRight => "bottom-right",
        }
    }

    /// Parses a stable container id string.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "bottom-left" => Some(Self::BottomLeft),
            "bottom-center" => Some(Self::BottomCenter),
            "bottom-right" => Some(Self::BottomRight),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Identity and display title of one panel.
pub struct PanelData {
    /// Unique panel id across containers, floating panels, and extractions.
    pub id: String,
    /// Human-readable title.
    pub title: String,
}

impl PanelData {
    /// Convenience constructor for owned id/title pairs.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A panel detached from any container, positioned freely in pixels.
pub struct FloatingPanel {
    /// Unique panel id.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Left edge in pixels; may be negative.
    pub x: f64,
    /// Top edge in pixels; may be negative.
    pub y: f64,
    /// Width in pixels, non-negative.
    pub width: f64,
    /// Height in pixels, non-negative.
    pub height: f64,
}

impl FloatingPanel {
    /// Returns the identity portion of this floating panel.
    pub fn panel_data(&self) -> PanelData {
        PanelData {
            id: self.id.clone(),
            title: self.title.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Last known floating geometry of a panel, keyed by panel id.
///
/// Position is only cached by extraction; docking a panel from floating keeps
/// size but drops position.
pub struct PanelSizeCache {
    /// Cached width in pixels.
    pub width: f64,
    /// Cached height in pixels.
    pub height: f64,
    /// Cached left edge, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Cached top edge, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
/// Where a panel lived at drag start or before extraction.
pub enum PanelSource {
    /// Docked in the named container.
    Container(ContainerId),
    /// Detached, in the floating list.
    Floating,
}

impl PanelSource {
    /// Returns the stable string form (`"floating"` or a container id).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Container(container) => container.as_str(),
            Self::Floating => "floating",
        }
    }
}

impl From<PanelSource> for String {
    fn from(source: PanelSource) -> Self {
        source.as_str().to_string()
    }
}

impl TryFrom<String> for PanelSource {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        if raw.trim() == "floating" {
            return Ok(Self::Floating);
        }
        ContainerId::parse(&raw)
            .map(Self::Container)
            .ok_or_else(|| format!("unknown panel source: {raw}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// A panel moved out of the main window entirely, pending re-dock.
pub struct ExtractedPanel {
    /// Unique panel id.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Where the panel returns when re-docked without an explicit target.
    pub source_container: PanelSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Pointer offset captured at drag start.
pub struct DragOffset {
    /// Horizontal offset in pixels.
    pub x: f64,
    /// Vertical offset in pixels.
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
/// Transient drag session; the panel and its source always travel together.
pub struct DragSession {
    /// Panel being dragged.
    pub panel: PanelData,
    /// Where the drag started.
    pub source: PanelSource,
    /// Pointer offset within the panel at drag start.
    pub offset: DragOffset,
}

#[derive(Debug, Clone, PartialEq, Default)]
/// Transient per-window interaction state, never persisted or broadcast.
///
/// At most one drag session is active; a new start replaces any prior session.
/// A drag abandoned without an explicit drop or end call stays active until the
/// next explicit action, so callers must pair starts with ends.
pub struct InteractionState {
    /// Active drag session, if any.
    pub dragging: Option<DragSession>,
}

#[derive(Debug, Clone, PartialEq)]
/// Durable panel state: container contents, floating panels, extractions, and
/// the floating-geometry cache.
pub struct PanelsState {
    /// Ordered panel lists per container.
    pub panels: BTreeMap<ContainerId, Vec<PanelData>>,
    /// Detached panels with free positions.
    pub floating_panels: Vec<FloatingPanel>,
    /// Panels moved to separate windows, pending re-dock.
    pub extracted_panels: Vec<ExtractedPanel>,
    /// Last known floating geometry per panel id.
    pub panel_sizes: BTreeMap<String, PanelSizeCache>,
}

impl Default for PanelsState {
    fn default() -> Self {
        Self {
            panels: default_container_panels(),
            floating_panels: Vec::new(),
            extracted_panels: Vec::new(),
            panel_sizes: BTreeMap::new(),
        }
    }
}

impl PanelsState {
    /// Returns the ordered panels docked in `container`; empty for an unknown
    /// or empty container.
    pub fn panels_for_container(&self, container: ContainerId) -> &[PanelData] {
        self.panels
            .get(&container)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns whether the panel is currently extracted.
    pub fn is_panel_extracted(&self, panel_id: &str) -> bool {
        self.extracted_panels.iter().any(|p| p.id == panel_id)
    }

    /// Returns the extraction record for a panel, if any.
    pub fn extracted_panel(&self, panel_id: &str) -> Option<&ExtractedPanel> {
        self.extracted_panels.iter().find(|p| p.id == panel_id)
    }

    /// Counts the distinct locations currently holding `panel_id`.
    ///
    /// Diagnostics helper; between operations this is always 0 or 1.
    pub fn location_count(&self, panel_id: &str) -> usize {
        let docked = self
            .panels
            .values()
            .any(|list| list.iter().any(|p| p.id == panel_id)) as usize;
        let floating = self.floating_panels.iter().any(|p| p.id == panel_id) as usize;
        let extracted = self.is_panel_extracted(panel_id) as usize;
        docked + floating + extracted
    }

    /// Builds the durable snapshot persisted and broadcast after mutations.
    pub fn snapshot(&self) -> PanelsSnapshot {
        PanelsSnapshot {
            panels: self.panels.clone(),
            floating_panels: self.floating_panels.clone(),
            extracted_panels: self.extracted_panels.clone(),
            panel_sizes: self.panel_sizes.clone(),
            dragging_panel: None,
            drag_source: None,
            drag_offset: None,
        }
    }

    /// Restores durable state from a snapshot, discarding any drag fields it
    /// may carry.
    pub fn from_snapshot(snapshot: PanelsSnapshot) -> Self {
        Self {
            panels: snapshot.panels,
            floating_panels: snapshot.floating_panels,
            extracted_panels: snapshot.extracted_panels,
            panel_sizes: snapshot.panel_sizes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Serialized form of [`PanelsState`] as persisted and broadcast.
///
/// Fields missing from a stored blob take their defaults (shallow merge over
/// defaults); unknown fields are ignored. There is no schema version field.
/// The drag fields are always written as `null` to match the stored layout.
pub struct PanelsSnapshot {
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
    /// Always `None`; drag state is never durable.
    #[serde(default)]
    pub dragging_panel: Option<PanelData>,
    /// Always `None`; drag state is never durable.
    #[serde(default)]
    pub drag_source: Option<PanelSource>,
    /// Always `None`; drag state is never durable.
    #[serde(default)]
    pub drag_offset: Option<DragOffset>,
}

impl Default for PanelsSnapshot {
    fn default() -> Self {
        PanelsState::default().snapshot()
    }
}

pub(crate) fn default_container_panels() -> BTreeMap<ContainerId, Vec<PanelData>> {
    let mut panels = BTreeMap::new();
    panels.insert(
        ContainerId::Left,
        vec![PanelData::new("demo-panel-left", "Explorer")],
    );
    panels.insert(
        ContainerId::Right,
        vec![PanelData::new("demo-panel-right", "Properties")],
    );
    panels.insert(ContainerId::BottomLeft, Vec::new());
    panels.insert(
        ContainerId::BottomCenter,
        vec![PanelData::new("demo-panel-bottom", "Console")],
    );
    panels.insert(ContainerId::BottomRight, Vec::new());
    panels
}
