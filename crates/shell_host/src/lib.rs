//! Typed host-domain contracts shared by the admin-shell runtime and its embedders.
//!
//! This crate is the API-first boundary for platform services consumed by the panel
//! runtime: per-origin key-value state storage, the cross-window broadcast bus, and
//! the color-scheme hook used by theme sync. Concrete browser or desktop adapters
//! live with the embedding application; every contract here ships a `Noop*` adapter
//! for unsupported targets and a `Memory*` adapter whose hub/handle split lets tests
//! simulate several windows of the same profile.
//!
//! # Example
//!
//! ```rust
//! use shell_host::{KeyValueStore, MemoryStorageHub};
//!
//! let hub = MemoryStorageHub::default();
//! let window = hub.window();
//! window.save("wpea-spa-ui", "{\"showActionPopovers\":true}").expect("save");
//! assert!(window.load("wpea-spa-ui").is_some());
//! ```

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod broadcast;
pub mod host;
pub mod storage;

pub use broadcast::{
    BroadcastBus, BroadcastHandler, MemoryBroadcastBus, MemoryBroadcastHub, NoopBroadcastBus,
};
pub use host::{
    ColorScheme, ColorSchemeApplier, HostServices, MemoryColorSchemeApplier,
    NoopColorSchemeApplier,
};
pub use storage::{
    load_json_with, save_json_with, KeyValueStore, MemoryKeyValueStore, MemoryStorageHub,
    NoopKeyValueStore, StorageChangeListener, StorageError,
};
