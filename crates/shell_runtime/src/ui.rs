//! Window-local UI state: modal flags, preview mode, and persisted preferences.

use std::{cell::RefCell, rc::Rc};

use serde::{Deserialize, Serialize};
use shell_host::{load_json_with, save_json_with, HostServices};

use crate::observe::{ObserverId, Observers};
use crate::persistence::UI_STORAGE_KEY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Full UI state of one window. Modal and preview flags are transient; the
/// `show_*` preferences persist.
pub struct UiState {
    /// Whether the settings modal is open.
    pub settings_modal_open: bool,
    /// Whether preview mode is active.
    pub preview_mode: bool,
    /// Whether action popovers are shown.
    pub show_action_popovers: bool,
    /// Whether container width overlays are shown.
    pub show_container_widths: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            settings_modal_open: false,
            preview_mode: false,
            show_action_popovers: true,
            show_container_widths: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
/// The persisted preference subset of [`UiState`].
pub struct UiPrefs {
    /// Whether action popovers are shown.
    pub show_action_popovers: bool,
    /// Whether container width overlays are shown.
    pub show_container_widths: bool,
}

impl Default for UiPrefs {
    fn default() -> Self {
        Self {
            show_action_popovers: true,
            show_container_widths: false,
        }
    }
}

struct UiStoreInner {
    state: UiState,
    observers: Observers<UiState>,
}

#[derive(Clone)]
/// One window's UI store. Never broadcast; preference fields persist under a
/// dedicated key so transient flags never reach storage.
pub struct UiStore {
    inner: Rc<RefCell<UiStoreInner>>,
    host: HostServices,
}

impl UiStore {
    /// Creates the store, loading persisted preferences over defaults.
    pub fn new(host: HostServices) -> Self {
        let prefs: UiPrefs = load_json_with(&*host.storage, UI_STORAGE_KEY).unwrap_or_default();
        let state = UiState {
            show_action_popovers: prefs.show_action_popovers,
            show_container_widths: prefs.show_container_widths,
            ..UiState::default()
        };
        Self {
            inner: Rc::new(RefCell::new(UiStoreInner {
                state,
                observers: Observers::default(),
            })),
            host,
        }
    }

    /// Current UI state.
    pub fn state(&self) -> UiState {
        self.inner.borrow().state
    }

    /// Opens the settings modal.
    pub fn open_settings_modal(&self) {
        self.commit(false, |state| state.settings_modal_open = true);
    }

    /// Closes the settings modal.
    pub fn close_settings_modal(&self) {
        self.commit(false, |state| state.settings_modal_open = false);
    }

    /// Toggles the settings modal.
    pub fn toggle_settings_modal(&self) {
        self.commit(false, |state| {
            state.settings_modal_open = !state.settings_modal_open;
        });
    }

    /// Enters preview mode.
    pub fn enter_preview_mode(&self) {
        self.commit(false, |state| state.preview_mode = true);
    }

    /// Exits preview mode.
    pub fn exit_preview_mode(&self) {
        self.commit(false, |state| state.preview_mode = false);
    }

    /// Toggles preview mode.
    pub fn toggle_preview_mode(&self) {
        self.commit(false, |state| state.preview_mode = !state.preview_mode);
    }

    /// Shows or hides action popovers; persisted.
    pub fn set_show_action_popovers(&self, show: bool) {
        self.commit(true, |state| state.show_action_popovers = show);
    }

    /// Shows or hides container width overlays; persisted.
    pub fn set_show_container_widths(&self, show: bool) {
        self.commit(true, |state| state.show_container_widths = show);
    }

    /// Registers an observer invoked after each effective UI change.
    pub fn subscribe(&self, observer: Rc<dyn Fn(&UiState)>) -> ObserverId {
        self.inner.borrow_mut().observers.insert(observer)
    }

    /// Removes a previously registered observer.
    pub fn unsubscribe(&self, id: ObserverId) {
        self.inner.borrow_mut().observers.remove(id);
    }

    fn commit(&self, persist: bool, mutate: impl FnOnce(&mut UiState)) {
        let (changed, handlers, state) = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            let prev = inner.state;
            mutate(&mut inner.state);
            let changed = inner.state != prev;
            let handlers = if changed {
                inner.observers.handlers()
            } else {
                Vec::new()
            };
            (changed, handlers, inner.state)
        };

        if persist {
            let prefs = UiPrefs {
                show_action_popovers: state.show_action_popovers,
                show_container_widths: state.show_container_widths,
            };
            if let Err(err) = save_json_with(&*self.host.storage, UI_STORAGE_KEY, &prefs) {
                log::warn!("failed to persist UI preferences: {err}");
            }
        }
        if changed {
            for handler in handlers {
                handler(&state);
            }
        }
    }
}
