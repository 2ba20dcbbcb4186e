//! Cross-window broadcast bus contracts and adapters.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

/// Callback invoked once per message received on a subscribed topic.
pub type BroadcastHandler = Rc<dyn Fn(&str)>;

/// Best-effort publish/subscribe channel between live windows of one profile.
///
/// There is no delivery guarantee and no ordering across publishers, but messages
/// from one sender arrive in send order. A publisher never receives its own
/// messages. Underlying channels are created lazily on first use of a topic and
/// reused for the handle's lifetime; transport failures are swallowed, so callers
/// that need a durable signal must pair publishing with a storage write.
pub trait BroadcastBus {
    /// Publishes `message` to every other live subscriber on `topic`.
    fn publish(&self, topic: &str, message: &str);

    /// Registers `handler` for messages published on `topic` by other windows.
    fn subscribe(&self, topic: &str, handler: BroadcastHandler);
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op bus for unsupported targets and baseline tests.
pub struct NoopBroadcastBus;

impl BroadcastBus for NoopBroadcastBus {
    fn publish(&self, _topic: &str, _message: &str) {}

    fn subscribe(&self, _topic: &str, _handler: BroadcastHandler) {}
}

#[derive(Default)]
struct BroadcastHubInner {
    topics: HashMap<String, Vec<(usize, BroadcastHandler)>>,
    publishes: HashMap<String, usize>,
    next_window: usize,
}

#[derive(Clone, Default)]
/// Shared in-memory bus backing one simulated browser profile.
///
/// Each [`MemoryBroadcastHub::window`] handle models one window; publishing
/// through a handle synchronously delivers to handlers registered by every other
/// handle on the same topic. The hub counts publishes per topic so tests can
/// assert that receivers do not echo.
pub struct MemoryBroadcastHub {
    inner: Rc<RefCell<BroadcastHubInner>>,
}

impl MemoryBroadcastHub {
    /// Opens a bus handle representing one window of the profile.
    pub fn window(&self) -> MemoryBroadcastBus {
        let mut inner = self.inner.borrow_mut();
        let window = inner.next_window;
        inner.next_window += 1;
        MemoryBroadcastBus {
            window,
            inner: Rc::clone(&self.inner),
        }
    }

    /// Returns how many messages have been published on `topic` so far.
    pub fn publish_count(&self, topic: &str) -> usize {
        self.inner
            .borrow()
            .publishes
            .get(topic)
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Clone)]
/// In-memory [`BroadcastBus`] handle scoped to one simulated window.
pub struct MemoryBroadcastBus {
    window: usize,
    inner: Rc<RefCell<BroadcastHubInner>>,
}

impl BroadcastBus for MemoryBroadcastBus {
    fn publish(&self, topic: &str, message: &str) {
        let handlers = {
            let mut inner = self.inner.borrow_mut();
            *inner.publishes.entry(topic.to_string()).or_insert(0) += 1;
            inner
                .topics
                .get(topic)
                .map(|subscribers| {
                    subscribers
                        .iter()
                        .filter(|(window, _)| *window != self.window)
                        .map(|(_, handler)| Rc::clone(handler))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()
        };
        // Invoked outside the borrow so a handler may publish in turn.
        for handler in handlers {
            handler(message);
        }
    }

    fn subscribe(&self, topic: &str, handler: BroadcastHandler) {
        self.inner
            .borrow_mut()
            .topics
            .entry(topic.to_string())
            .or_default()
            .push((self.window, handler));
    }
}
