//! Per-window layout sizing, visibility, and alignment state.
//!
//! Layout is persisted so a reloaded window keeps its sizes, but it is never
//! broadcast; each window keeps its own arrangement.

use std::{cell::RefCell, rc::Rc};

use serde::{Deserialize, Serialize};
use shell_host::{load_json_with, save_json_with, HostServices};

use crate::observe::{ObserverId, Observers};
use crate::persistence::LAYOUT_STORAGE_KEY;

/// Lower clamp for the top panel height, tighter than the shared panel range.
pub const TOP_BAR_MIN_HEIGHT: f64 = 40.0;
/// Upper clamp for the top panel height.
pub const TOP_BAR_MAX_HEIGHT: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Icon size scale used by icon bars.
pub enum IconSize {
    /// Extra small, 12px.
    Xs,
    /// Small, 16px.
    S,
    /// Medium, 20px.
    M,
    /// Large, 24px.
    L,
}

impl IconSize {
    /// Pixel size for this scale step.
    pub const fn px(self) -> f64 {
        match self {
            Self::Xs => 12.0,
            Self::S => 16.0,
            Self::M => 20.0,
            Self::L => 24.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Vertical alignment of the side shortcut bars.
pub enum VerticalAlign {
    /// Align to the top edge.
    Top,
    /// Center along the axis.
    Center,
    /// Align to the bottom edge.
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Horizontal alignment of the bottom shortcut bar.
pub enum HorizontalAlign {
    /// Align to the left edge.
    Left,
    /// Center along the axis.
    Center,
    /// Align to the right edge.
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// Complete per-window layout state, shallow-merged over defaults on load.
pub struct LayoutState {
    /// Top panel height in pixels.
    pub top_panel_height: f64,
    /// Bottom panel height in pixels.
    pub bottom_panel_height: f64,
    /// Left panel width in pixels.
    pub left_panel_width: f64,
    /// Right panel width in pixels.
    pub right_panel_width: f64,
    /// Bottom-left section width in pixels.
    pub bottom_left_width: f64,
    /// Bottom-right section width in pixels.
    pub bottom_right_width: f64,

    /// Whether the top panel is shown.
    pub top_panel_visible: bool,
    /// Whether the bottom panel is shown.
    pub bottom_panel_visible: bool,
    /// Whether the left panel is shown.
    pub left_panel_visible: bool,
    /// Whether the right panel is shown.
    pub right_panel_visible: bool,

    /// Whether the left icon bar is shown.
    pub left_icon_bar_visible: bool,
    /// Whether the right icon bar is shown.
    pub right_icon_bar_visible: bool,
    /// Whether the bottom icon bar is shown.
    pub bottom_icon_bar_visible: bool,

    /// Lower clamp for resizable panel dimensions.
    pub min_panel_size: f64,
    /// Upper clamp for resizable panel dimensions.
    pub max_panel_size: f64,
    /// Icon bar thickness in pixels.
    pub icon_bar_width: f64,
    /// Top bar height in pixels.
    pub top_bar_height: f64,

    /// Action icon size in pixels.
    pub action_icon_size: f64,
    /// Shortcut icon size in pixels.
    pub shortcut_icon_size: f64,

    /// Vertical alignment of the left shortcut bar.
    pub left_shortcut_align: VerticalAlign,
    /// Vertical alignment of the right shortcut bar.
    pub right_shortcut_align: VerticalAlign,
    /// Horizontal alignment of the bottom shortcut bar.
    pub bottom_shortcut_align: HorizontalAlign,

    /// Margin around the content frame in pixels.
    pub content_frame_margin: f64,
    /// Fixed content frame width; `None` fills the available space.
    pub content_frame_width: Option<f64>,
}

impl Default for LayoutState {
    fn default() -> Self {
        Self {
            top_panel_height: 48.0,
            bottom_panel_height: 200.0,
            left_panel_width: 250.0,
            right_panel_width: 250.0,
            bottom_left_width: 250.0,
            bottom_right_width: 250.0,

            top_panel_visible: true,
            bottom_panel_visible: true,
            left_panel_visible: true,
            right_panel_visible: true,

            left_icon_bar_visible: true,
            right_icon_bar_visible: true,
            bottom_icon_bar_visible: true,

            min_panel_size: 100.0,
            max_panel_size: 600.0,
            icon_bar_width: 48.0,
            top_bar_height: 48.0,

            action_icon_size: 32.0,
            shortcut_icon_size: 18.0,

            left_shortcut_align: VerticalAlign::Top,
            right_shortcut_align: VerticalAlign::Top,
            bottom_shortcut_align: HorizontalAlign::Center,

            content_frame_margin: 6.0,
            content_frame_width: None,
        }
    }
}

impl LayoutState {
    fn clamp_panel_size(&self, size: f64) -> f64 {
        size.clamp(self.min_panel_size, self.max_panel_size)
    }
}

struct LayoutStoreInner {
    state: LayoutState,
    observers: Observers<LayoutState>,
}

#[derive(Clone)]
/// One window's layout store.
///
/// Every mutation persists the full state; observers are notified only when a
/// mutation actually changed something.
pub struct LayoutStore {
    inner: Rc<RefCell<LayoutStoreInner>>,
    host: HostServices,
}

impl LayoutStore {
    /// Creates the store, loading persisted layout or defaults.
    pub fn new(host: HostServices) -> Self {
        let state = load_json_with(&*host.storage, LAYOUT_STORAGE_KEY).unwrap_or_default();
        Self {
            inner: Rc::new(RefCell::new(LayoutStoreInner {
                state,
                observers: Observers::default(),
            })),
            host,
        }
    }

    /// Current layout state.
    pub fn state(&self) -> LayoutState {
        self.inner.borrow().state.clone()
    }

    /// Sets the left panel width, clamped to `[min_panel_size, max_panel_size]`.
    pub fn set_left_panel_width(&self, width: f64) {
        self.commit(|state| state.left_panel_width = state.clamp_panel_size(width));
    }

    /// Sets the right panel width, clamped to the shared panel range.
    pub fn set_right_panel_width(&self, width: f64) {
        self.commit(|state| state.right_panel_width = state.clamp_panel_size(width));
    }

    /// Sets the bottom panel height, clamped to the shared panel range.
    pub fn set_bottom_panel_height(&self, height: f64) {
        self.commit(|state| state.bottom_panel_height = state.clamp_panel_size(height));
    }

    /// Sets the bottom-left section width, clamped to the shared panel range.
    pub fn set_bottom_left_width(&self, width: f64) {
        self.commit(|state| state.bottom_left_width = state.clamp_panel_size(width));
    }

    /// Sets the bottom-right section width, clamped to the shared panel range.
    pub fn set_bottom_right_width(&self, width: f64) {
        self.commit(|state| state.bottom_right_width = state.clamp_panel_size(width));
    }

    /// Sets the top panel height, clamped to its own tighter range.
    pub fn set_top_panel_height(&self, height: f64) {
        self.commit(|state| {
            state.top_panel_height = height.clamp(TOP_BAR_MIN_HEIGHT, TOP_BAR_MAX_HEIGHT);
        });
    }

    /// Toggles the top panel.
    pub fn toggle_top_panel(&self) {
        self.commit(|state| state.top_panel_visible = !state.top_panel_visible);
    }

    /// Toggles the bottom panel.
    pub fn toggle_bottom_panel(&self) {
        self.commit(|state| state.bottom_panel_visible = !state.bottom_panel_visible);
    }

    /// Toggles the left panel.
    pub fn toggle_left_panel(&self) {
        self.commit(|state| state.left_panel_visible = !state.left_panel_visible);
    }

    /// Toggles the right panel.
    pub fn toggle_right_panel(&self) {
        self.commit(|state| state.right_panel_visible = !state.right_panel_visible);
    }

    /// Shows or hides the left panel.
    pub fn set_left_panel_visible(&self, visible: bool) {
        self.commit(|state| state.left_panel_visible = visible);
    }

    /// Shows or hides the right panel.
    pub fn set_right_panel_visible(&self, visible: bool) {
        self.commit(|state| state.right_panel_visible = visible);
    }

    /// Shows or hides the bottom panel.
    pub fn set_bottom_panel_visible(&self, visible: bool) {
        self.commit(|state| state.bottom_panel_visible = visible);
    }

    /// Shows or hides the left icon bar.
    pub fn set_left_icon_bar_visible(&self, visible: bool) {
        self.commit(|state| state.left_icon_bar_visible = visible);
    }

    /// Shows or hides the right icon bar.
    pub fn set_right_icon_bar_visible(&self, visible: bool) {
        self.commit(|state| state.right_icon_bar_visible = visible);
    }

    /// Shows or hides the bottom icon bar.
    pub fn set_bottom_icon_bar_visible(&self, visible: bool) {
        self.commit(|state| state.bottom_icon_bar_visible = visible);
    }

    /// Sets the left shortcut bar alignment.
    pub fn set_left_shortcut_align(&self, align: VerticalAlign) {
        self.commit(|state| state.left_shortcut_align = align);
    }

    /// Sets the right shortcut bar alignment.
    pub fn set_right_shortcut_align(&self, align: VerticalAlign) {
        self.commit(|state| state.right_shortcut_align = align);
    }

    /// Sets the bottom shortcut bar alignment.
    pub fn set_bottom_shortcut_align(&self, align: HorizontalAlign) {
        self.commit(|state| state.bottom_shortcut_align = align);
    }

    /// Sets a fixed content frame width; `None` fills the available space.
    pub fn set_content_frame_width(&self, width: Option<f64>) {
        self.commit(|state| state.content_frame_width = width);
    }

    /// Resets every field back to its default.
    pub fn reset(&self) {
        self.commit(|state| *state = LayoutState::default());
    }

    /// Registers an observer invoked after each effective layout change.
    pub fn subscribe(&self, observer: Rc<dyn Fn(&LayoutState)>) -> ObserverId {
        self.inner.borrow_mut().observers.insert(observer)
    }

    /// Removes a previously registered observer.
    pub fn unsubscribe(&self, id: ObserverId) {
        self.inner.borrow_mut().observers.remove(id);
    }

    // Persists after every mutation, changed or not, matching how the stored
    // blob has always been written. Observers only see effective changes.
    fn commit(&self, mutate: impl FnOnce(&mut LayoutState)) {
        let (changed, handlers, state) = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            let prev = inner.state.clone();
            mutate(&mut inner.state);
            let changed = inner.state != prev;
            let handlers = if changed {
                inner.observers.handlers()
            } else {
                Vec::new()
            };
            (changed, handlers, inner.state.clone())
        };

        if let Err(err) = save_json_with(&*self.host.storage, LAYOUT_STORAGE_KEY, &state) {
            log::warn!("failed to persist layout state: {err}");
        }
        if changed {
            for handler in handlers {
                handler(&state);
            }
        }
    }
}
