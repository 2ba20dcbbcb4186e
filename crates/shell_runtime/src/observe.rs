//! Shared observer registry used by the runtime stores.

use std::rc::Rc;

/// Handle returned by a store's `subscribe`; pass it back to `unsubscribe`.
pub type ObserverId = usize;

/// Ordered observer registry. Observers fire in registration order after a
/// transition commits; they must be invoked with all store borrows released.
pub(crate) struct Observers<A: ?Sized> {
    next_id: ObserverId,
    entries: Vec<(ObserverId, Rc<dyn Fn(&A)>)>,
}

impl<A: ?Sized> Default for Observers<A> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<A: ?Sized> Observers<A> {
    pub(crate) fn insert(&mut self, observer: Rc<dyn Fn(&A)>) -> ObserverId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, observer));
        id
    }

    pub(crate) fn remove(&mut self, id: ObserverId) {
        self.entries.retain(|(entry_id, _)| *entry_id != id);
    }

    /// Clones the registered callbacks out so the caller can drop its borrow
    /// of the store before invoking them.
    pub(crate) fn handlers(&self) -> Vec<Rc<dyn Fn(&A)>> {
        self.entries
            .iter()
            .map(|(_, observer)| Rc::clone(observer))
            .collect()
    }
}
