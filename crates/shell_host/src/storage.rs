//! Key-value state storage contracts and adapters.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
/// Error kinds surfaced by [`KeyValueStore`] writes.
///
/// Callers are allowed to ignore these; the runtime stores log failures and keep
/// in-memory state authoritative.
pub enum StorageError {
    /// The value could not be serialized to JSON text.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The storage backend rejected the operation (unavailable, quota, ...).
    #[error("storage backend failed: {0}")]
    Backend(String),
}

/// Callback invoked when another window of the same profile replaces a stored key.
///
/// Arguments are the key and its new raw value. Mirrors browser `storage` event
/// semantics: the writing window itself is never notified.
pub type StorageChangeListener = Rc<dyn Fn(&str, &str)>;

/// Host service for durable per-origin key-value state (raw text per key).
pub trait KeyValueStore {
    /// Loads the raw value stored under `key`.
    ///
    /// Fails soft: backend errors yield `None`, never an error.
    fn load(&self, key: &str) -> Option<String>;

    /// Saves a raw value under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend is unavailable or rejects the write.
    fn save(&self, key: &str, raw: &str) -> Result<(), StorageError>;

    /// Deletes the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend is unavailable or rejects the delete.
    fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Registers a listener for replacements made by other windows.
    fn subscribe_changes(&self, listener: StorageChangeListener);
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op store for unsupported targets and baseline tests.
pub struct NoopKeyValueStore;

impl KeyValueStore for NoopKeyValueStore {
    fn load(&self, _key: &str) -> Option<String> {
        None
    }

    fn save(&self, _key: &str, _raw: &str) -> Result<(), StorageError> {
        Ok(())
    }

    fn delete(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }

    fn subscribe_changes(&self, _listener: StorageChangeListener) {}
}

#[derive(Default)]
struct StorageHubInner {
    values: HashMap<String, String>,
    listeners: Vec<(usize, StorageChangeListener)>,
    next_window: usize,
}

#[derive(Clone, Default)]
/// Shared in-memory storage backing one simulated browser profile.
///
/// Each [`MemoryStorageHub::window`] handle sees the same values; a save made
/// through one handle notifies change listeners registered on every other handle.
pub struct MemoryStorageHub {
    inner: Rc<RefCell<StorageHubInner>>,
}

impl MemoryStorageHub {
    /// Opens a store handle representing one window of the profile.
    pub fn window(&self) -> MemoryKeyValueStore {
        let mut inner = self.inner.borrow_mut();
        let window = inner.next_window;
        inner.next_window += 1;
        MemoryKeyValueStore {
            window,
            inner: Rc::clone(&self.inner),
        }
    }
}

#[derive(Clone)]
/// In-memory [`KeyValueStore`] handle scoped to one simulated window.
pub struct MemoryKeyValueStore {
    window: usize,
    inner: Rc<RefCell<StorageHubInner>>,
}

impl KeyValueStore for MemoryKeyValueStore {
    fn load(&self, key: &str) -> Option<String> {
        self.inner.borrow().values.get(key).cloned()
    }

    fn save(&self, key: &str, raw: &str) -> Result<(), StorageError> {
        let listeners = {
            let mut inner = self.inner.borrow_mut();
            inner.values.insert(key.to_string(), raw.to_string());
            inner
                .listeners
                .iter()
                .filter(|(window, _)| *window != self.window)
                .map(|(_, listener)| Rc::clone(listener))
                .collect::<Vec<_>>()
        };
        // Invoked outside the borrow so a listener may read the store again.
        for listener in listeners {
            listener(key, raw);
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.inner.borrow_mut().values.remove(key);
        Ok(())
    }

    fn subscribe_changes(&self, listener: StorageChangeListener) {
        self.inner
            .borrow_mut()
            .listeners
            .push((self.window, listener));
    }
}

/// Loads and deserializes a typed JSON value through a [`KeyValueStore`].
///
/// Fails soft: a missing key, backend failure, or malformed JSON all yield `None`;
/// parse failures are logged.
pub fn load_json_with<S: KeyValueStore + ?Sized, T: DeserializeOwned>(
    store: &S,
    key: &str,
) -> Option<T> {
    let raw = store.load(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("failed to parse stored value for {key}: {err}");
            None
        }
    }
}

/// Serializes and saves a typed JSON value through a [`KeyValueStore`].
///
/// # Errors
///
/// Returns an error when serialization or the store write fails.
pub fn save_json_with<S: KeyValueStore + ?Sized, T: Serialize>(
    store: &S,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    store.save(key, &raw)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct PrefThing {
        details_visible: bool,
    }

    #[test]
    fn memory_store_round_trip_and_delete() {
        let hub = MemoryStorageHub::default();
        let store = hub.window();

        store.save("pref.key", "{\"k\":1}").expect("save");
        assert_eq!(store.load("pref.key"), Some("{\"k\":1}".to_string()));
        store.delete("pref.key").expect("delete");
        assert_eq!(store.load("pref.key"), None);
    }

    #[test]
    fn windows_of_one_hub_share_values() {
        let hub = MemoryStorageHub::default();
        let first = hub.window();
        let second = hub.window();

        first.save("shared", "1").expect("save");
        assert_eq!(second.load("shared"), Some("1".to_string()));
    }

    #[test]
    fn change_listeners_fire_for_other_windows_only() {
        let hub = MemoryStorageHub::default();
        let writer = hub.window();
        let reader = hub.window();

        let writer_seen = Rc::new(Cell::new(0_u32));
        let reader_seen = Rc::new(Cell::new(0_u32));
        {
            let seen = Rc::clone(&writer_seen);
            writer.subscribe_changes(Rc::new(move |_, _| seen.set(seen.get() + 1)));
        }
        {
            let seen = Rc::clone(&reader_seen);
            reader.subscribe_changes(Rc::new(move |key, value| {
                assert_eq!(key, "k");
                assert_eq!(value, "v");
                seen.set(seen.get() + 1);
            }));
        }

        writer.save("k", "v").expect("save");
        assert_eq!(writer_seen.get(), 0);
        assert_eq!(reader_seen.get(), 1);
    }

    #[test]
    fn typed_json_helpers_round_trip() {
        let hub = MemoryStorageHub::default();
        let store = hub.window();
        save_json_with(
            &store,
            "prefs",
            &PrefThing {
                details_visible: true,
            },
        )
        .expect("save typed value");

        let loaded: Option<PrefThing> = load_json_with(&store, "prefs");
        assert_eq!(
            loaded,
            Some(PrefThing {
                details_visible: true,
            })
        );
    }

    #[test]
    fn malformed_json_loads_as_none() {
        let hub = MemoryStorageHub::default();
        let store = hub.window();
        store.save("prefs", "{not json").expect("save");
        let loaded: Option<PrefThing> = load_json_with(&store, "prefs");
        assert_eq!(loaded, None);
    }

    #[test]
    fn noop_store_is_empty_and_successful() {
        let store = NoopKeyValueStore;
        assert_eq!(store.load("k"), None);
        store.save("k", "{}").expect("save");
        store.delete("k").expect("delete");
    }
}
