//! Headless state core for the admin-shell panel system.
//!
//! Tracks which panels live in which docking containers, supports drag/drop
//! reparenting, floating panels, extraction to separate windows, per-window
//! layout sizing, and a tri-state theme mode. Durable slices persist through
//! the injected [`shell_host::KeyValueStore`] and replicate to other windows of
//! the same profile over the [`shell_host::BroadcastBus`] (whole-snapshot,
//! last writer wins), with a storage-change fallback for receivers that missed
//! the bus. Rendering is the embedder's job; stores expose their state plus an
//! explicit observer interface.
//!
//! # Example
//!
//! ```rust
//! use shell_host::HostServices;
//! use shell_runtime::{ContainerId, PanelsStore};
//!
//! let store = PanelsStore::new(HostServices::noop());
//! assert_eq!(store.panels_for_container(ContainerId::Left).len(), 1);
//! ```

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod layout;
pub mod model;
mod observe;
pub mod persistence;
pub mod reducer;
pub mod store;
pub mod theme;
pub mod ui;

pub use layout::{HorizontalAlign, IconSize, LayoutState, LayoutStore, VerticalAlign};
pub use model::*;
pub use observe::ObserverId;
pub use persistence::{
    PanelsSyncMessage, PanelsWireState, ThemeSyncMessage, LAYOUT_STORAGE_KEY,
    PANELS_STORAGE_KEY, PANELS_SYNC_TOPIC, THEME_STORAGE_KEY, THEME_SYNC_TOPIC, UI_STORAGE_KEY,
};
pub use reducer::{reduce_panels, PanelsAction, RuntimeEffect};
pub use store::PanelsStore;
pub use theme::{ThemeMode, ThemeStore};
pub use ui::{UiPrefs, UiState, UiStore};
