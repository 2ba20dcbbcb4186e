//! Tri-state theme mode with cross-window sync.

use std::{cell::RefCell, rc::Rc};

use serde::{Deserialize, Serialize};
use shell_host::{ColorScheme, HostServices};

use crate::observe::{ObserverId, Observers};
use crate::persistence::{ThemeSyncMessage, THEME_STORAGE_KEY, THEME_SYNC_TOPIC};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// The three selectable theme modes.
pub enum ThemeMode {
    /// Always light.
    Light,
    /// Always dark.
    Dark,
    /// Follow the platform preference.
    #[default]
    System,
}

impl ThemeMode {
    /// Stable string form used in storage and wire payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    /// Parses a stored mode string; anything unrecognized reads as `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    /// The next mode in the cycle light, dark, system.
    pub const fn next(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::System,
            Self::System => Self::Light,
        }
    }

    /// The color-scheme hint this mode applies to the host surface.
    pub const fn color_scheme(self) -> ColorScheme {
        match self {
            Self::Light => ColorScheme::Light,
            Self::Dark => ColorScheme::Dark,
            Self::System => ColorScheme::LightDark,
        }
    }
}

struct ThemeStoreInner {
    mode: ThemeMode,
    observers: Observers<ThemeMode>,
}

#[derive(Clone)]
/// One window's theme store.
///
/// The mode is stored as a bare string, not JSON, matching the existing
/// profile data. Local changes apply the color scheme, persist, and
/// broadcast; adopted remote changes apply and notify only, so theme
/// messages never ping-pong between windows.
pub struct ThemeStore {
    inner: Rc<RefCell<ThemeStoreInner>>,
    host: HostServices,
}

impl ThemeStore {
    /// Creates the store, loading the persisted mode (or `system`), applying
    /// its color scheme, and subscribing to remote changes.
    pub fn new(host: HostServices) -> Self {
        let mode = host
            .storage
            .load(THEME_STORAGE_KEY)
            .and_then(|raw| ThemeMode::parse(&raw))
            .unwrap_or_default();
        host.color_scheme.apply(mode.color_scheme());

        let inner = Rc::new(RefCell::new(ThemeStoreInner {
            mode,
            observers: Observers::default(),
        }));

        {
            let inner = Rc::clone(&inner);
            let applier = Rc::clone(&host.color_scheme);
            host.broadcast.subscribe(
                THEME_SYNC_TOPIC,
                Rc::new(move |raw| match serde_json::from_str(raw) {
                    Ok(ThemeSyncMessage::ThemeChange { mode }) => {
                        adopt_remote_mode(&inner, &*applier, mode);
                    }
                    Err(err) => log::warn!("ignoring malformed theme sync message: {err}"),
                }),
            );
        }
        {
            let inner = Rc::clone(&inner);
            let applier = Rc::clone(&host.color_scheme);
            host.storage.subscribe_changes(Rc::new(move |key, raw| {
                if key != THEME_STORAGE_KEY {
                    return;
                }
                if let Some(mode) = ThemeMode::parse(raw) {
                    adopt_remote_mode(&inner, &*applier, mode);
                }
            }));
        }

        Self { inner, host }
    }

    /// The current mode.
    pub fn mode(&self) -> ThemeMode {
        self.inner.borrow().mode
    }

    /// Selects `mode`: applies its color scheme, persists it, broadcasts it,
    /// and notifies observers. Reselecting the current mode still does all of
    /// this, matching the durable write the interface has always made.
    pub fn set_theme(&self, mode: ThemeMode) {
        let handlers = {
            let mut guard = self.inner.borrow_mut();
            guard.mode = mode;
            guard.observers.handlers()
        };

        self.host.color_scheme.apply(mode.color_scheme());
        if let Err(err) = self.host.storage.save(THEME_STORAGE_KEY, mode.as_str()) {
            log::warn!("failed to persist theme mode: {err}");
        }
        match serde_json::to_string(&ThemeSyncMessage::ThemeChange { mode }) {
            Ok(raw) => self.host.broadcast.publish(THEME_SYNC_TOPIC, &raw),
            Err(err) => log::warn!("failed to encode theme sync message: {err}"),
        }

        for handler in handlers {
            handler(&mode);
        }
    }

    /// Advances to the next mode in the cycle light, dark, system.
    pub fn cycle_theme(&self) {
        let next = self.mode().next();
        self.set_theme(next);
    }

    /// Registers an observer invoked after every mode change.
    pub fn subscribe(&self, observer: Rc<dyn Fn(&ThemeMode)>) -> ObserverId {
        self.inner.borrow_mut().observers.insert(observer)
    }

    /// Removes a previously registered observer.
    pub fn unsubscribe(&self, id: ObserverId) {
        self.inner.borrow_mut().observers.remove(id);
    }
}

/// Adopts a mode announced by another window. A mode equal to the current one
/// is dropped early; otherwise the scheme is applied and observers notified,
/// with no persist and no re-broadcast.
fn adopt_remote_mode(
    inner: &Rc<RefCell<ThemeStoreInner>>,
    applier: &dyn shell_host::ColorSchemeApplier,
    mode: ThemeMode,
) {
    let handlers = {
        let mut guard = inner.borrow_mut();
        if guard.mode == mode {
            return;
        }
        guard.mode = mode;
        guard.observers.handlers()
    };
    applier.apply(mode.color_scheme());
    for handler in handlers {
        handler(&mode);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use shell_host::{
        KeyValueStore, MemoryBroadcastHub, MemoryColorSchemeApplier, MemoryStorageHub,
        NoopColorSchemeApplier,
    };

    use super::*;

    struct Profile {
        storage: MemoryStorageHub,
        broadcast: MemoryBroadcastHub,
    }

    impl Profile {
        fn new() -> Self {
            Self {
                storage: MemoryStorageHub::default(),
                broadcast: MemoryBroadcastHub::default(),
            }
        }

        fn window(&self, applier: MemoryColorSchemeApplier) -> HostServices {
            HostServices {
                storage: Rc::new(self.storage.window()),
                broadcast: Rc::new(self.broadcast.window()),
                color_scheme: Rc::new(applier),
            }
        }
    }

    #[test]
    fn cycling_three_times_returns_to_the_starting_mode() {
        let store = ThemeStore::new(HostServices::noop());
        assert_eq!(store.mode(), ThemeMode::System);

        store.cycle_theme();
        assert_eq!(store.mode(), ThemeMode::Light);
        store.cycle_theme();
        assert_eq!(store.mode(), ThemeMode::Dark);
        store.cycle_theme();
        assert_eq!(store.mode(), ThemeMode::System);
    }

    #[test]
    fn mode_persists_as_a_bare_string() {
        let profile = Profile::new();
        let store = ThemeStore::new(profile.window(MemoryColorSchemeApplier::default()));

        store.set_theme(ThemeMode::Dark);
        assert_eq!(
            profile.storage.window().load(THEME_STORAGE_KEY),
            Some("dark".to_string())
        );

        let reloaded = ThemeStore::new(profile.window(MemoryColorSchemeApplier::default()));
        assert_eq!(reloaded.mode(), ThemeMode::Dark);
    }

    #[test]
    fn unrecognized_stored_mode_falls_back_to_system() {
        let profile = Profile::new();
        profile
            .storage
            .window()
            .save(THEME_STORAGE_KEY, "sepia")
            .expect("save");

        let store = ThemeStore::new(profile.window(MemoryColorSchemeApplier::default()));
        assert_eq!(store.mode(), ThemeMode::System);
    }

    #[test]
    fn remote_changes_are_adopted_and_applied_without_echo() {
        let profile = Profile::new();
        let first = ThemeStore::new(profile.window(MemoryColorSchemeApplier::default()));
        let applier = MemoryColorSchemeApplier::default();
        let second = ThemeStore::new(profile.window(applier.clone()));

        first.set_theme(ThemeMode::Light);

        assert_eq!(second.mode(), ThemeMode::Light);
        assert_eq!(
            applier.applied(),
            vec![ColorScheme::LightDark, ColorScheme::Light]
        );
        // Only the originating window published.
        assert_eq!(profile.broadcast.publish_count(THEME_SYNC_TOPIC), 1);
    }

    #[test]
    fn adopting_the_current_mode_is_a_noop() {
        let profile = Profile::new();
        let applier = MemoryColorSchemeApplier::default();
        let store = ThemeStore::new(profile.window(applier.clone()));
        let applied_at_startup = applier.applied().len();

        let foreign = profile.broadcast.window();
        shell_host::BroadcastBus::publish(
            &foreign,
            THEME_SYNC_TOPIC,
            r#"{"type":"theme-change","mode":"system"}"#,
        );

        assert_eq!(store.mode(), ThemeMode::System);
        assert_eq!(applier.applied().len(), applied_at_startup);
    }

    #[test]
    fn storage_change_fallback_adopts_the_new_mode() {
        let profile = Profile::new();
        let store = ThemeStore::new(HostServices {
            storage: Rc::new(profile.storage.window()),
            broadcast: Rc::new(shell_host::NoopBroadcastBus),
            color_scheme: Rc::new(NoopColorSchemeApplier),
        });

        profile
            .storage
            .window()
            .save(THEME_STORAGE_KEY, "dark")
            .expect("save");
        assert_eq!(store.mode(), ThemeMode::Dark);
    }

    #[test]
    fn startup_applies_the_loaded_color_scheme() {
        let profile = Profile::new();
        profile
            .storage
            .window()
            .save(THEME_STORAGE_KEY, "light")
            .expect("save");

        let applier = MemoryColorSchemeApplier::default();
        let _store = ThemeStore::new(profile.window(applier.clone()));
        assert_eq!(applier.applied(), vec![ColorScheme::Light]);
    }
}
