//! Reducer actions, side-effect intents, and transition logic for panel state.

use crate::model::{
    ContainerId, DragOffset, DragSession, ExtractedPanel, FloatingPanel, InteractionState,
    PanelData, PanelSizeCache, PanelSource, PanelsSnapshot, PanelsState, DEFAULT_FLOATING_HEIGHT,
    DEFAULT_FLOATING_WIDTH, DEFAULT_FLOATING_X, DEFAULT_FLOATING_Y,
};

#[derive(Debug, Clone, PartialEq)]
/// Actions accepted by [`reduce_panels`] to mutate [`PanelsState`].
pub enum PanelsAction {
    /// Begin a drag session; replaces any prior session.
    StartDrag {
        /// Panel being dragged.
        panel: PanelData,
        /// Where the drag started.
        source: PanelSource,
        /// Pointer offset within the panel.
        offset: DragOffset,
    },
    /// Clear the drag session without other side effects.
    EndDrag,
    /// Drop the dragged panel into a container.
    DropPanel {
        /// Destination container.
        target: ContainerId,
        /// Insert position in the target list; appends when `None`. The index
        /// is interpreted against the list after the dragged panel has been
        /// removed from it, clamped to the list length.
        insert_index: Option<usize>,
    },
    /// Drop the dragged panel as a floating panel at a pointer position.
    DropPanelAsFloating {
        /// Pointer x at drop.
        x: f64,
        /// Pointer y at drop.
        y: f64,
    },
    /// Move an existing floating panel.
    UpdateFloatingPanelPosition {
        /// Panel to move.
        id: String,
        /// New left edge.
        x: f64,
        /// New top edge.
        y: f64,
    },
    /// Resize an existing floating panel.
    UpdateFloatingPanelSize {
        /// Panel to resize.
        id: String,
        /// New width.
        width: f64,
        /// New height.
        height: f64,
    },
    /// Move a panel out of the main window, recording its origin.
    ExtractPanel {
        /// Panel to extract.
        id: String,
        /// Where the panel currently lives.
        source: PanelSource,
    },
    /// Return an extracted panel to the main window.
    DockPanel {
        /// Panel to dock.
        id: String,
        /// Destination container; defaults to the recorded origin.
        target: Option<ContainerId>,
    },
    /// Adopt an authoritative snapshot from another window wholesale.
    AdoptSnapshot {
        /// Replacement durable state.
        snapshot: PanelsSnapshot,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Side-effect intents emitted by [`reduce_panels`] for the owning store to
/// execute after the transition commits.
pub enum RuntimeEffect {
    /// Persist the durable panel snapshot.
    PersistPanels,
    /// Broadcast the durable panel snapshot to other windows.
    BroadcastPanels,
}

/// Applies a [`PanelsAction`] to the panel state and collects side effects.
///
/// Unmet preconditions (no active drag, unknown panel id, unknown container)
/// are silent no-ops that return no effects. Remote adoption intentionally
/// returns no effects so receivers never echo a snapshot back.
pub fn reduce_panels(
    state: &mut PanelsState,
    interaction: &mut InteractionState,
    action: PanelsAction,
) -> Vec<RuntimeEffect> {
    match action {
        PanelsAction::StartDrag {
            panel,
            source,
            offset,
        } => {
            interaction.dragging = Some(DragSession {
                panel,
                source,
                offset,
            });
            Vec::new()
        }
        PanelsAction::EndDrag => {
            interaction.dragging = None;
            Vec::new()
        }
        PanelsAction::DropPanel {
            target,
            insert_index,
        } => {
            let Some(session) = interaction.dragging.take() else {
                return Vec::new();
            };
            remove_from_source(state, &session.panel.id, session.source, false);

            let list = state.panels.entry(target).or_default();
            let index = insert_index.unwrap_or(list.len()).min(list.len());
            list.insert(
                index,
                PanelData {
                    id: session.panel.id,
                    title: session.panel.title,
                },
            );
            persist_and_broadcast()
        }
        PanelsAction::DropPanelAsFloating { x, y } => {
            let Some(session) = interaction.dragging.take() else {
                return Vec::new();
            };
            let left = x - session.offset.x;
            let top = y - session.offset.y;

            match session.source {
                PanelSource::Floating => {
                    // Already floating: just reposition the existing entry.
                    if let Some(panel) = state
                        .floating_panels
                        .iter_mut()
                        .find(|p| p.id == session.panel.id)
                    {
                        panel.x = left;
                        panel.y = top;
                    }
                }
                PanelSource::Container(container) => {
                    remove_from_container(state, &session.panel.id, container);
                    let cached = state.panel_sizes.get(&session.panel.id);
                    state.floating_panels.push(FloatingPanel {
                        id: session.panel.id,
                        title: session.panel.title,
                        x: left,
                        y: top,
                        width: cached.map_or(DEFAULT_FLOATING_WIDTH, |c| c.width),
                        height: cached.map_or(DEFAULT_FLOATING_HEIGHT, |c| c.height),
                    });
                }
            }
            persist_and_broadcast()
        }
        PanelsAction::UpdateFloatingPanelPosition { id, x, y } => {
            match state.floating_panels.iter_mut().find(|p| p.id == id) {
                Some(panel) => {
                    panel.x = x;
                    panel.y = y;
                    persist_and_broadcast()
                }
                None => Vec::new(),
            }
        }
        PanelsAction::UpdateFloatingPanelSize { id, width, height } => {
            match state.floating_panels.iter_mut().find(|p| p.id == id) {
                Some(panel) => {
                    panel.width = width;
                    panel.height = height;
                    persist_and_broadcast()
                }
                None => Vec::new(),
            }
        }
        PanelsAction::ExtractPanel { id, source } => {
            let Some(panel) = remove_from_source(state, &id, source, true) else {
                return Vec::new();
            };
            state.extracted_panels.push(ExtractedPanel {
                id: panel.id,
                title: panel.title,
                source_container: source,
            });
            persist_and_broadcast()
        }
        PanelsAction::DockPanel { id, target } => {
            let Some(index) = state.extracted_panels.iter().position(|p| p.id == id) else {
                return Vec::new();
            };
            let extracted = state.extracted_panels.remove(index);

            match extracted.source_container {
                PanelSource::Floating => {
                    let cached = state.panel_sizes.get(&id).copied();
                    state.floating_panels.push(FloatingPanel {
                        id: extracted.id,
                        title: extracted.title,
                        x: cached.and_then(|c| c.x).unwrap_or(DEFAULT_FLOATING_X),
                        y: cached.and_then(|c| c.y).unwrap_or(DEFAULT_FLOATING_Y),
                        width: cached.map_or(DEFAULT_FLOATING_WIDTH, |c| c.width),
                        height: cached.map_or(DEFAULT_FLOATING_HEIGHT, |c| c.height),
                    });
                }
                PanelSource::Container(origin) => {
                    let destination = target.unwrap_or(origin);
                    state.panels.entry(destination).or_default().push(PanelData {
                        id: extracted.id,
                        title: extracted.title,
                    });
                }
            }
            persist_and_broadcast()
        }
        PanelsAction::AdoptSnapshot { snapshot } => {
            *state = PanelsState::from_snapshot(snapshot);
            interaction.dragging = None;
            Vec::new()
        }
    }
}

fn persist_and_broadcast() -> Vec<RuntimeEffect> {
    vec![RuntimeEffect::PersistPanels, RuntimeEffect::BroadcastPanels]
}

/// Removes `panel_id` from `source`, caching floating geometry first.
///
/// Docking a floating panel caches its size only and drops any cached
/// position; extraction (`cache_position`) keeps position too so a later
/// dock can restore it. Returns the removed panel identity, or `None` when
/// it was not there.
fn remove_from_source(
    state: &mut PanelsState,
    panel_id: &str,
    source: PanelSource,
    cache_position: bool,
) -> Option<PanelData> {
    match source {
        PanelSource::Floating => {
            let index = state.floating_panels.iter().position(|p| p.id == panel_id)?;
            let floating = state.floating_panels.remove(index);
            state.panel_sizes.insert(
                floating.id.clone(),
                PanelSizeCache {
                    width: floating.width,
                    height: floating.height,
                    x: cache_position.then_some(floating.x),
                    y: cache_position.then_some(floating.y),
                },
            );
            Some(floating.panel_data())
        }
        PanelSource::Container(container) => remove_from_container(state, panel_id, container),
    }
}

fn remove_from_container(
    state: &mut PanelsState,
    panel_id: &str,
    container: ContainerId,
) -> Option<PanelData> {
    let list = state.panels.get_mut(&container)?;
    let index = list.iter().position(|p| p.id == panel_id)?;
    Some(list.remove(index))
}
