use serde::Serialize;
use tracing::{debug, info, warn};

use crate::pipeline::tags::TagSelection;
use crate::view_state::scroll::ScrollContainer;
use crate::view_state::storage::{KeyValueStore, ScopedStorage};

/// Device-scoped: `"0"` grid, `"1"` inline.
pub const LAYOUT_KEY: &str = "inline";
/// Session-scoped: the persisted tag selection.
pub const SELECTED_TAG_KEY: &str = "selectedTag";
/// Session-scoped: list scroll offset captured on tag changes.
pub const SCROLL_POSITION_KEY: &str = "scrollPosition";

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    #[default]
    Grid,
    Inline,
}

impl LayoutMode {
    /// Only `"1"` selects the inline layout; anything else is grid.
    pub fn from_persisted(value: Option<&str>) -> Self {
        match value {
            Some("1") => LayoutMode::Inline,
            _ => LayoutMode::Grid,
        }
    }

    pub fn as_persisted(&self) -> &'static str {
        match self {
            LayoutMode::Grid => "0",
            LayoutMode::Inline => "1",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            LayoutMode::Grid => LayoutMode::Inline,
            LayoutMode::Inline => LayoutMode::Grid,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub selected_tag: TagSelection,
    pub layout: LayoutMode,
    pub map_visible: bool,
}

/// Owns the viewer's view preferences and is the only writer of the
/// persistence scopes.
pub struct ViewStateStore {
    storage: ScopedStorage,
    state: ViewState,
}

impl ViewStateStore {
    /// Builds the store at first mount. Layout comes from the device scope, the
    /// tag from the session scope, then the saved scroll offset is applied.
    /// None of this depends on server data being available.
    pub fn mount(storage: ScopedStorage, container: Option<&mut dyn ScrollContainer>) -> Self {
        let layout = LayoutMode::from_persisted(storage.device.get(LAYOUT_KEY).as_deref());
        let selected_tag =
            TagSelection::from_persisted(storage.session.get(SELECTED_TAG_KEY).as_deref());
        info!(layout = ?layout, tag = %selected_tag, "Mounted view state.");

        let store = Self {
            storage,
            state: ViewState {
                selected_tag,
                layout,
                map_visible: false,
            },
        };
        store.restore_scroll_position(container);
        store
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn selected_tag(&self) -> &TagSelection {
        &self.state.selected_tag
    }

    pub fn layout(&self) -> LayoutMode {
        self.state.layout
    }

    pub fn map_visible(&self) -> bool {
        self.state.map_visible
    }

    /// Switches the tag filter and remembers where the list was scrolled.
    pub fn set_tag(&mut self, tag: TagSelection, container: Option<&dyn ScrollContainer>) {
        let scroll_top = container.map(|c| c.scroll_top()).unwrap_or(0);
        debug!(tag = %tag, scroll_top, "Tag selection changed.");

        persist(&*self.storage.session, SELECTED_TAG_KEY, tag.as_persisted());
        persist(&*self.storage.session, SCROLL_POSITION_KEY, &scroll_top.to_string());
        self.state.selected_tag = tag;
    }

    pub fn set_layout_mode(&mut self, mode: LayoutMode) {
        debug!(layout = ?mode, "Layout mode changed.");
        persist(&*self.storage.device, LAYOUT_KEY, mode.as_persisted());
        self.state.layout = mode;
    }

    pub fn toggle_layout_mode(&mut self) -> LayoutMode {
        let next = self.state.layout.toggled();
        self.set_layout_mode(next);
        next
    }

    pub fn toggle_map(&mut self) -> bool {
        self.state.map_visible = !self.state.map_visible;
        self.state.map_visible
    }

    /// Applies the session-saved offset to `container`, if both exist.
    /// Returns the applied offset.
    pub fn restore_scroll_position(
        &self,
        container: Option<&mut dyn ScrollContainer>,
    ) -> Option<usize> {
        let raw = self.storage.session.get(SCROLL_POSITION_KEY)?;
        let Some(offset) = parse_scroll_position(&raw) else {
            debug!(value = %raw, "Ignoring unreadable saved scroll position.");
            return None;
        };
        let Some(container) = container else {
            debug!(offset, "No list container yet, scroll position not applied.");
            return None;
        };
        container.set_scroll_top(offset);
        debug!(offset, "Restored scroll position.");
        Some(offset)
    }
}

fn persist(store: &dyn KeyValueStore, key: &str, value: &str) {
    if let Err(e) = store.set(key, value) {
        warn!(key, error = %e, "Failed to persist view state, keeping in-memory value.");
    }
}

fn parse_scroll_position(raw: &str) -> Option<usize> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value.max(0) as usize);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(|value| value.max(0.0).round() as usize)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::view_state::scroll::ListViewport;
    use crate::view_state::storage::{FileStorage, MemoryStorage, StorageError};

    struct ReadOnlyStorage;

    impl KeyValueStore for ReadOnlyStorage {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Write {
                path: key.into(),
                source: std::io::Error::other("read-only"),
            })
        }
    }

    #[test]
    fn test_mount_defaults_without_persisted_state() {
        let store = ViewStateStore::mount(ScopedStorage::in_memory(), None);
        assert_eq!(store.layout(), LayoutMode::Grid);
        assert_eq!(store.selected_tag(), &TagSelection::All);
        assert!(!store.map_visible());
    }

    #[test]
    fn test_layout_toggle_governs_next_load() {
        let dir = tempfile::tempdir().unwrap();
        let device_path = dir.path().join("device.json");
        let session: Arc<dyn KeyValueStore> = Arc::new(MemoryStorage::new());

        let device: Arc<dyn KeyValueStore> = Arc::new(FileStorage::open(&device_path).unwrap());
        let mut store =
            ViewStateStore::mount(ScopedStorage::new(session.clone(), device.clone()), None);
        assert_eq!(store.layout(), LayoutMode::Grid);
        assert_eq!(store.layout().as_persisted(), "0");

        assert_eq!(store.toggle_layout_mode(), LayoutMode::Inline);
        assert_eq!(device.get(LAYOUT_KEY).as_deref(), Some("1"));
        drop(store);
        drop(device);

        let device: Arc<dyn KeyValueStore> = Arc::new(FileStorage::open(&device_path).unwrap());
        let store = ViewStateStore::mount(ScopedStorage::new(session, device), None);
        assert_eq!(store.layout(), LayoutMode::Inline);
    }

    #[test]
    fn test_unknown_layout_value_is_grid() {
        let storage = ScopedStorage::in_memory();
        storage.device.set(LAYOUT_KEY, "true").unwrap();
        let store = ViewStateStore::mount(storage, None);
        assert_eq!(store.layout(), LayoutMode::Grid);
    }

    #[test]
    fn test_set_tag_persists_tag_and_scroll() {
        let mut viewport = ListViewport::new(5);
        viewport.set_scroll_top(14);
        let storage = ScopedStorage::in_memory();
        let session = storage.session.clone();
        let mut store = ViewStateStore::mount(storage, None);

        store.set_tag(TagSelection::Tag("web".into()), Some(&viewport));
        assert_eq!(session.get(SELECTED_TAG_KEY).as_deref(), Some("web"));
        assert_eq!(session.get(SCROLL_POSITION_KEY).as_deref(), Some("14"));
        assert_eq!(store.selected_tag(), &TagSelection::Tag("web".into()));

        store.set_tag(TagSelection::All, None);
        assert_eq!(session.get(SELECTED_TAG_KEY).as_deref(), Some("defaultTag"));
        assert_eq!(session.get(SCROLL_POSITION_KEY).as_deref(), Some("0"));
    }

    #[test]
    fn test_tag_and_scroll_restored_on_remount() {
        let storage = ScopedStorage::in_memory();
        let mut viewport = ListViewport::new(5);
        viewport.set_scroll_top(9);
        let mut store = ViewStateStore::mount(storage.clone(), None);
        store.set_tag(TagSelection::Tag("db".into()), Some(&viewport));
        store.toggle_map();
        drop(store);

        let mut fresh = ListViewport::new(5);
        let store = ViewStateStore::mount(storage, Some(&mut fresh));
        assert_eq!(store.selected_tag(), &TagSelection::Tag("db".into()));
        assert_eq!(fresh.scroll_top(), 9);
        assert!(!store.map_visible());
    }

    #[test]
    fn test_restore_after_back_navigation() {
        let storage = ScopedStorage::in_memory();
        storage.session.set(SCROLL_POSITION_KEY, "30").unwrap();
        let store = ViewStateStore::mount(storage, None);

        let mut viewport = ListViewport::new(10);
        viewport.scroll_down(3);
        assert_eq!(store.restore_scroll_position(Some(&mut viewport)), Some(30));
        assert_eq!(viewport.scroll_top(), 30);
    }

    #[test]
    fn test_restore_ignores_missing_or_bad_values() {
        let storage = ScopedStorage::in_memory();
        let store = ViewStateStore::mount(storage.clone(), None);
        let mut viewport = ListViewport::new(10);
        viewport.set_scroll_top(4);

        assert_eq!(store.restore_scroll_position(Some(&mut viewport)), None);
        storage.session.set(SCROLL_POSITION_KEY, "").unwrap();
        assert_eq!(store.restore_scroll_position(Some(&mut viewport)), None);
        storage.session.set(SCROLL_POSITION_KEY, "abc").unwrap();
        assert_eq!(store.restore_scroll_position(Some(&mut viewport)), None);
        assert_eq!(viewport.scroll_top(), 4);

        storage.session.set(SCROLL_POSITION_KEY, "-7").unwrap();
        assert_eq!(store.restore_scroll_position(Some(&mut viewport)), Some(0));
        storage.session.set(SCROLL_POSITION_KEY, "12.6").unwrap();
        assert_eq!(store.restore_scroll_position(Some(&mut viewport)), Some(13));
    }

    #[test]
    fn test_toggle_map_is_not_persisted() {
        let storage = ScopedStorage::in_memory();
        let mut store = ViewStateStore::mount(storage.clone(), None);
        assert!(store.toggle_map());
        assert!(!store.toggle_map());
        assert!(store.toggle_map());
        drop(store);
        assert!(!ViewStateStore::mount(storage, None).map_visible());
    }

    #[test]
    fn test_failed_writes_keep_in_memory_state() {
        let storage = ScopedStorage::new(Arc::new(ReadOnlyStorage), Arc::new(ReadOnlyStorage));
        let mut store = ViewStateStore::mount(storage, None);
        store.set_tag(TagSelection::Tag("web".into()), None);
        store.set_layout_mode(LayoutMode::Inline);
        assert_eq!(store.selected_tag(), &TagSelection::Tag("web".into()));
        assert_eq!(store.layout(), LayoutMode::Inline);
    }
}
