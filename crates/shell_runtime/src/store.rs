//! Panel store: owns panel state, dispatches reducer actions, executes effects.

use std::{cell::RefCell, rc::Rc};

use shell_host::HostServices;

use crate::model::{
    ContainerId, DragOffset, DragSession, ExtractedPanel, FloatingPanel, InteractionState,
    PanelData, PanelSource, PanelsSnapshot, PanelsState,
};
use crate::observe::{ObserverId, Observers};
use crate::persistence::{
    broadcast_panels, load_panels, persist_panels, PanelsSyncMessage, PANELS_STORAGE_KEY,
    PANELS_SYNC_TOPIC,
};
use crate::reducer::{reduce_panels, PanelsAction, RuntimeEffect};

struct PanelsStoreInner {
    state: PanelsState,
    interaction: InteractionState,
    observers: Observers<PanelsState>,
}

#[derive(Clone)]
/// One window's view of the shared panel system.
///
/// Construction loads the persisted snapshot (or defaults) and subscribes to
/// both the broadcast topic and storage-change notifications, so remote
/// mutations are adopted for the store's whole lifetime. Local mutations
/// persist and broadcast the new snapshot; adopted remote snapshots never
/// echo back out.
pub struct PanelsStore {
    inner: Rc<RefCell<PanelsStoreInner>>,
    host: HostServices,
}

impl PanelsStore {
    /// Creates the store for one window on top of the given host services.
    pub fn new(host: HostServices) -> Self {
        let state = load_panels(&*host.storage)
            .map(PanelsState::from_snapshot)
            .unwrap_or_default();
        let inner = Rc::new(RefCell::new(PanelsStoreInner {
            state,
            interaction: InteractionState::default(),
            observers: Observers::default(),
        }));

        {
            let inner = Rc::clone(&inner);
            host.broadcast.subscribe(
                PANELS_SYNC_TOPIC,
                Rc::new(move |raw| match serde_json::from_str(raw) {
                    Ok(PanelsSyncMessage::StateUpdate { state }) => adopt(&inner, state.into()),
                    Err(err) => log::warn!("ignoring malformed panel sync message: {err}"),
                }),
            );
        }
        {
            // Fallback for windows that missed the broadcast (opened later,
            // or on hosts without a working channel).
            let inner = Rc::clone(&inner);
            host.storage.subscribe_changes(Rc::new(move |key, raw| {
                if key != PANELS_STORAGE_KEY {
                    return;
                }
                match serde_json::from_str::<PanelsSnapshot>(raw) {
                    Ok(snapshot) => adopt(&inner, snapshot),
                    Err(err) => log::warn!("ignoring malformed stored panel state: {err}"),
                }
            }));
        }

        Self { inner, host }
    }

    /// Begins dragging `panel` from `source`; replaces any active session.
    pub fn start_drag(&self, panel: PanelData, source: PanelSource, offset: DragOffset) {
        self.dispatch(PanelsAction::StartDrag {
            panel,
            source,
            offset,
        });
    }

    /// Abandons the active drag session, if any.
    pub fn end_drag(&self) {
        self.dispatch(PanelsAction::EndDrag);
    }

    /// Drops the dragged panel into `target` at `insert_index` (append when
    /// `None`). No-op without an active session.
    pub fn drop_panel(&self, target: ContainerId, insert_index: Option<usize>) {
        self.dispatch(PanelsAction::DropPanel {
            target,
            insert_index,
        });
    }

    /// Drops the dragged panel as a floating panel positioned so the grab
    /// point stays under the pointer. No-op without an active session.
    pub fn drop_panel_as_floating(&self, x: f64, y: f64) {
        self.dispatch(PanelsAction::DropPanelAsFloating { x, y });
    }

    /// Moves the floating panel `id`; no-op for unknown ids.
    pub fn update_floating_panel_position(&self, id: &str, x: f64, y: f64) {
        self.dispatch(PanelsAction::UpdateFloatingPanelPosition {
            id: id.to_string(),
            x,
            y,
        });
    }

    /// Resizes the floating panel `id`; no-op for unknown ids.
    pub fn update_floating_panel_size(&self, id: &str, width: f64, height: f64) {
        self.dispatch(PanelsAction::UpdateFloatingPanelSize {
            id: id.to_string(),
            width,
            height,
        });
    }

    /// Moves panel `id` out of the main window, recording where it came from.
    ///
    /// Returns the panel's identity so the caller can open the external
    /// window, or `None` when the panel was not found at `source`.
    pub fn extract_panel(&self, id: &str, source: PanelSource) -> Option<PanelData> {
        let changed = self.dispatch(PanelsAction::ExtractPanel {
            id: id.to_string(),
            source,
        });
        if !changed {
            return None;
        }
        self.inner
            .borrow()
            .state
            .extracted_panel(id)
            .map(|extracted| PanelData::new(&extracted.id, &extracted.title))
    }

    /// Returns an extracted panel to the main window, at `target` or its
    /// recorded origin. No-op when `id` is not extracted.
    pub fn dock_panel(&self, id: &str, target: Option<ContainerId>) {
        self.dispatch(PanelsAction::DockPanel {
            id: id.to_string(),
            target,
        });
    }

    /// Snapshot of the current durable and transient panel state.
    pub fn state(&self) -> PanelsState {
        self.inner.borrow().state.clone()
    }

    /// The active drag session, if any.
    pub fn dragging(&self) -> Option<DragSession> {
        self.inner.borrow().interaction.dragging.clone()
    }

    /// Panels docked in `container`, in display order.
    pub fn panels_for_container(&self, container: ContainerId) -> Vec<PanelData> {
        self.inner
            .borrow()
            .state
            .panels_for_container(container)
            .to_vec()
    }

    /// Current floating panels, in creation order.
    pub fn floating_panels(&self) -> Vec<FloatingPanel> {
        self.inner.borrow().state.floating_panels.clone()
    }

    /// Whether panel `id` currently lives in an external window.
    pub fn is_panel_extracted(&self, id: &str) -> bool {
        self.inner.borrow().state.is_panel_extracted(id)
    }

    /// The extraction record for panel `id`, if extracted.
    pub fn extracted_panel(&self, id: &str) -> Option<ExtractedPanel> {
        self.inner.borrow().state.extracted_panel(id).cloned()
    }

    /// Registers an observer invoked after every observable state change,
    /// local or adopted.
    pub fn subscribe(&self, observer: Rc<dyn Fn(&PanelsState)>) -> ObserverId {
        self.inner.borrow_mut().observers.insert(observer)
    }

    /// Removes a previously registered observer.
    pub fn unsubscribe(&self, id: ObserverId) {
        self.inner.borrow_mut().observers.remove(id);
    }

    fn dispatch(&self, action: PanelsAction) -> bool {
        let (changed, effects, snapshot, handlers, state) = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            let prev_state = inner.state.clone();
            let prev_interaction = inner.interaction.clone();
            let effects = reduce_panels(&mut inner.state, &mut inner.interaction, action);
            let changed =
                inner.state != prev_state || inner.interaction != prev_interaction;
            let snapshot = (!effects.is_empty()).then(|| inner.state.snapshot());
            let handlers = if changed {
                inner.observers.handlers()
            } else {
                Vec::new()
            };
            (changed, effects, snapshot, handlers, inner.state.clone())
        };

        // Effects and observers run with the store borrow released so they
        // may call back into the store.
        if let Some(snapshot) = snapshot {
            for effect in effects {
                match effect {
                    RuntimeEffect::PersistPanels => {
                        persist_panels(&*self.host.storage, &snapshot);
                    }
                    RuntimeEffect::BroadcastPanels => {
                        broadcast_panels(&*self.host.broadcast, &snapshot);
                    }
                }
            }
        }
        for handler in handlers {
            handler(&state);
        }
        changed
    }
}

/// Applies a remote snapshot wholesale and notifies observers on change.
/// Never persists or re-broadcasts, so snapshots cannot ping-pong.
fn adopt(inner: &Rc<RefCell<PanelsStoreInner>>, snapshot: PanelsSnapshot) {
    let (handlers, state) = {
        let mut guard = inner.borrow_mut();
        let cell = &mut *guard;
        let prev_state = cell.state.clone();
        let had_drag = cell.interaction.dragging.is_some();
        reduce_panels(
            &mut cell.state,
            &mut cell.interaction,
            PanelsAction::AdoptSnapshot { snapshot },
        );
        if cell.state == prev_state && !had_drag {
            return;
        }
        (cell.observers.handlers(), cell.state.clone())
    };
    for handler in handlers {
        handler(&state);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use pretty_assertions::assert_eq;
    use shell_host::{
        BroadcastBus, KeyValueStore, MemoryBroadcastHub, MemoryStorageHub, NoopBroadcastBus,
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

        fn window(&self) -> HostServices {
            HostServices {
                storage: Rc::new(self.storage.window()),
                broadcast: Rc::new(self.broadcast.window()),
                color_scheme: Rc::new(NoopColorSchemeApplier),
            }
        }
    }

    fn drag_left_panel(store: &PanelsStore) {
        let panel = store.panels_for_container(ContainerId::Left)[0].clone();
        store.start_drag(
            panel,
            PanelSource::Container(ContainerId::Left),
            DragOffset { x: 0.0, y: 0.0 },
        );
    }

    #[test]
    fn fresh_store_starts_with_default_panels() {
        let store = PanelsStore::new(HostServices::noop());
        assert_eq!(
            store.panels_for_container(ContainerId::Left)[0].id,
            "demo-panel-left"
        );
        assert!(store.floating_panels().is_empty());
        assert!(store.dragging().is_none());
    }

    #[test]
    fn construction_loads_the_persisted_snapshot() {
        let profile = Profile::new();
        {
            let first = PanelsStore::new(profile.window());
            drag_left_panel(&first);
            first.drop_panel(ContainerId::Right, Some(0));
        }

        let second = PanelsStore::new(profile.window());
        assert!(second.panels_for_container(ContainerId::Left).is_empty());
        assert_eq!(
            second.panels_for_container(ContainerId::Right)[0].id,
            "demo-panel-left"
        );
    }

    #[test]
    fn malformed_persisted_state_falls_back_to_defaults() {
        let profile = Profile::new();
        profile
            .storage
            .window()
            .save(PANELS_STORAGE_KEY, "{broken")
            .expect("save");

        let store = PanelsStore::new(profile.window());
        assert_eq!(store.panels_for_container(ContainerId::Left).len(), 1);
    }

    #[test]
    fn local_mutations_replicate_to_other_windows_without_echo() {
        let profile = Profile::new();
        let first = PanelsStore::new(profile.window());
        let second = PanelsStore::new(profile.window());

        drag_left_panel(&first);
        first.drop_panel(ContainerId::BottomCenter, None);

        let bottom = second.panels_for_container(ContainerId::BottomCenter);
        assert_eq!(bottom.last().map(|p| p.id.as_str()), Some("demo-panel-left"));
        // The receiver adopted without publishing its own snapshot.
        assert_eq!(profile.broadcast.publish_count(PANELS_SYNC_TOPIC), 1);
    }

    #[test]
    fn storage_change_fallback_covers_windows_without_a_bus() {
        let profile = Profile::new();
        let publisher = PanelsStore::new(profile.window());
        let offline = PanelsStore::new(HostServices {
            storage: Rc::new(profile.storage.window()),
            broadcast: Rc::new(NoopBroadcastBus),
            color_scheme: Rc::new(NoopColorSchemeApplier),
        });

        drag_left_panel(&publisher);
        publisher.drop_panel_as_floating(30.0, 40.0);

        let floating = offline.floating_panels();
        assert_eq!(floating.len(), 1);
        assert_eq!((floating[0].x, floating[0].y), (30.0, 40.0));
    }

    #[test]
    fn adopting_a_remote_snapshot_cancels_the_local_drag() {
        let profile = Profile::new();
        let first = PanelsStore::new(profile.window());
        let second = PanelsStore::new(profile.window());

        drag_left_panel(&second);
        assert!(second.dragging().is_some());

        drag_left_panel(&first);
        first.drop_panel(ContainerId::Right, None);

        assert!(second.dragging().is_none());
    }

    #[test]
    fn extract_returns_the_panel_identity_and_replicates() {
        let profile = Profile::new();
        let first = PanelsStore::new(profile.window());
        let second = PanelsStore::new(profile.window());

        let extracted = first
            .extract_panel("demo-panel-right", PanelSource::Container(ContainerId::Right))
            .expect("extracted");
        assert_eq!(extracted.title, "Properties");
        assert!(second.is_panel_extracted("demo-panel-right"));

        assert_eq!(
            first.extract_panel("demo-panel-right", PanelSource::Container(ContainerId::Right)),
            None
        );
    }

    #[test]
    fn dock_panel_round_trips_an_extraction_across_windows() {
        let profile = Profile::new();
        let first = PanelsStore::new(profile.window());
        let second = PanelsStore::new(profile.window());

        first
            .extract_panel("demo-panel-bottom", PanelSource::Container(ContainerId::BottomCenter))
            .expect("extracted");
        second.dock_panel("demo-panel-bottom", None);

        assert!(!first.is_panel_extracted("demo-panel-bottom"));
        assert_eq!(
            first
                .panels_for_container(ContainerId::BottomCenter)
                .last()
                .map(|p| p.id.clone()),
            Some("demo-panel-bottom".to_string())
        );
    }

    #[test]
    fn observers_fire_on_changes_and_stop_after_unsubscribe() {
        let store = PanelsStore::new(HostServices::noop());
        let hits = Rc::new(Cell::new(0_u32));
        let id = {
            let hits = Rc::clone(&hits);
            store.subscribe(Rc::new(move |_| hits.set(hits.get() + 1)))
        };

        drag_left_panel(&store);
        store.drop_panel(ContainerId::Right, None);
        assert_eq!(hits.get(), 2);

        // A drop with no active session changes nothing and stays silent.
        store.drop_panel(ContainerId::Left, None);
        assert_eq!(hits.get(), 2);

        store.unsubscribe(id);
        let panel = store.panels_for_container(ContainerId::Right)[0].clone();
        store.start_drag(
            panel,
            PanelSource::Container(ContainerId::Right),
            DragOffset { x: 0.0, y: 0.0 },
        );
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn transient_drag_state_is_never_persisted_as_active() {
        let profile = Profile::new();
        let store = PanelsStore::new(profile.window());

        drag_left_panel(&store);
        store.drop_panel(ContainerId::Right, None);

        let raw = profile
            .storage
            .window()
            .load(PANELS_STORAGE_KEY)
            .expect("persisted");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["draggingPanel"], serde_json::Value::Null);
        assert_eq!(value["dragSource"], serde_json::Value::Null);
        assert_eq!(value["dragOffset"], serde_json::Value::Null);
    }

    #[test]
    fn malformed_broadcast_messages_are_ignored() {
        let profile = Profile::new();
        let store = PanelsStore::new(profile.window());
        let before = store.state();

        let foreign = profile.broadcast.window();
        foreign.publish(PANELS_SYNC_TOPIC, "{not json");
        foreign.publish(PANELS_SYNC_TOPIC, r#"{"type":"unknown"}"#);

        assert_eq!(store.state(), before);
    }
}
