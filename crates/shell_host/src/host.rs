//! Host service bundle and the color-scheme capability used by theme sync.

use std::{cell::RefCell, rc::Rc};

use crate::{BroadcastBus, KeyValueStore, NoopBroadcastBus, NoopKeyValueStore};

/// Color-scheme hint the shell applies to the document when the theme changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    /// Force light rendering.
    Light,
    /// Force dark rendering.
    Dark,
    /// Follow the platform preference.
    LightDark,
}

impl ColorScheme {
    /// Returns the CSS `color-scheme` property value for this hint.
    pub const fn css_value(self) -> &'static str {
        match self {
            Self::Light => "light only",
            Self::Dark => "dark only",
            Self::LightDark => "light dark",
        }
    }
}

/// Host hook that makes a [`ColorScheme`] visible (for example by setting the
/// `color-scheme` style on the document body).
pub trait ColorSchemeApplier {
    /// Applies `scheme` to the host surface.
    fn apply(&self, scheme: ColorScheme);
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op applier for headless targets and baseline tests.
pub struct NoopColorSchemeApplier;

impl ColorSchemeApplier for NoopColorSchemeApplier {
    fn apply(&self, _scheme: ColorScheme) {}
}

#[derive(Clone, Default)]
/// Recording applier for tests; remembers every applied scheme in order.
pub struct MemoryColorSchemeApplier {
    applied: Rc<RefCell<Vec<ColorScheme>>>,
}

impl MemoryColorSchemeApplier {
    /// Returns the schemes applied so far, oldest first.
    pub fn applied(&self) -> Vec<ColorScheme> {
        self.applied.borrow().clone()
    }
}

impl ColorSchemeApplier for MemoryColorSchemeApplier {
    fn apply(&self, scheme: ColorScheme) {
        self.applied.borrow_mut().push(scheme);
    }
}

#[derive(Clone)]
/// Host service bundle injected into the shell runtime stores.
///
/// All environment-specific service selection happens before this bundle crosses
/// into the runtime, which keeps the state core decoupled from browser or desktop
/// adapter details. The bundle is assembled once per window by the embedding
/// application root and passed to each store it constructs.
pub struct HostServices {
    /// Durable per-origin key-value store.
    pub storage: Rc<dyn KeyValueStore>,
    /// Cross-window broadcast bus.
    pub broadcast: Rc<dyn BroadcastBus>,
    /// Color-scheme application hook.
    pub color_scheme: Rc<dyn ColorSchemeApplier>,
}

impl HostServices {
    /// Bundle of no-op services for headless targets and baseline tests.
    pub fn noop() -> Self {
        Self {
            storage: Rc::new(NoopKeyValueStore),
            broadcast: Rc::new(NoopBroadcastBus),
            color_scheme: Rc::new(NoopColorSchemeApplier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_values_match_the_color_scheme_property_grammar() {
        assert_eq!(ColorScheme::Light.css_value(), "light only");
        assert_eq!(ColorScheme::Dark.css_value(), "dark only");
        assert_eq!(ColorScheme::LightDark.css_value(), "light dark");
    }

    #[test]
    fn memory_applier_records_in_order() {
        let applier = MemoryColorSchemeApplier::default();
        applier.apply(ColorScheme::Dark);
        applier.apply(ColorScheme::LightDark);
        assert_eq!(
            applier.applied(),
            vec![ColorScheme::Dark, ColorScheme::LightDark]
        );
    }
}
