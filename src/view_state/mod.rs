//! Viewer preferences and their persistence scopes.

pub mod scroll;
pub mod storage;
pub mod store;

pub use scroll::{ListViewport, ScrollContainer};
pub use storage::{FileStorage, KeyValueStore, MemoryStorage, ScopedStorage, StorageError};
pub use store::{LayoutMode, ViewState, ViewStateStore};
