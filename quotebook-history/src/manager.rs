//! The history manager facade: one integration surface composing the stack,
//! the persistence adapter, and the notification hub.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use quotebook_store::StorageBackend;

use crate::hub::{ListenerId, NotificationHub};
use crate::persist::HistoryPersistence;
use crate::stack::HistoryStack;
use crate::DEFAULT_CAPACITY;

/// Runtime configuration for a history manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryOptions {
    /// Maximum number of retained snapshots, oldest evicted first.
    pub capacity: usize,
    /// Whether mutations are written through to storage.
    pub persistence_enabled: bool,
}

impl Default for HistoryOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            persistence_enabled: true,
        }
    }
}

/// Undo/redo manager over an opaque snapshot type `S`.
///
/// Every mutation runs in the same order: update the in-memory timeline,
/// write through to storage (best-effort), then notify subscribers. Callers
/// apply the snapshot returned by [`undo`]/[`redo`] back to their live state;
/// the manager never touches application state itself.
///
/// [`undo`]: HistoryManager::undo
/// [`redo`]: HistoryManager::redo
#[derive(Debug)]
pub struct HistoryManager<S, B> {
    stack: HistoryStack<S>,
    persistence: HistoryPersistence<B>,
    hub: NotificationHub,
}

impl<S, B> HistoryManager<S, B>
where
    S: Clone + Serialize + DeserializeOwned,
    B: StorageBackend,
{
    /// Build a manager under `key`, rehydrating any timeline previously
    /// saved there; otherwise the stack is seeded with `initial`.
    pub fn new(initial: S, backend: B, key: impl Into<String>, options: HistoryOptions) -> Self {
        let persistence = HistoryPersistence::new(backend, key, options.persistence_enabled);
        let stack = persistence.load(options.capacity).unwrap_or_else(|| {
            info!(key = %persistence.key(), capacity = options.capacity,
                "no saved history, seeding fresh stack");
            HistoryStack::with_capacity(initial, options.capacity)
        });
        Self {
            stack,
            persistence,
            hub: NotificationHub::new(),
        }
    }

    /// Record `state` as the new current snapshot. The caller computes the
    /// new whole-application state first and hands it over here.
    pub fn track_action(&mut self, state: S, description: impl Into<String>) {
        let description = description.into();
        debug!(description = %description, "tracking action");
        self.stack.push(state, description);
        self.persistence.save(&self.stack);
        self.hub.notify();
    }

    /// Step back one snapshot. Returns the snapshot to re-apply, or `None`
    /// when there is nothing to undo (never an error).
    pub fn undo(&mut self) -> Option<S> {
        if !self.stack.can_undo() {
            return None;
        }
        let state = self.stack.undo().clone();
        debug!(cursor = self.stack.cursor(), "undo applied");
        self.persistence.save(&self.stack);
        self.hub.notify();
        Some(state)
    }

    /// Step forward one snapshot. Returns the snapshot to re-apply, or
    /// `None` when there is nothing to redo.
    pub fn redo(&mut self) -> Option<S> {
        if !self.stack.can_redo() {
            return None;
        }
        let state = self.stack.redo().clone();
        debug!(cursor = self.stack.cursor(), "redo applied");
        self.persistence.save(&self.stack);
        self.hub.notify();
        Some(state)
    }

    pub fn can_undo(&self) -> bool {
        self.stack.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.stack.can_redo()
    }

    pub fn current_action_description(&self) -> &str {
        self.stack.current_description()
    }

    pub fn previous_action_description(&self) -> &str {
        self.stack.previous_description()
    }

    pub fn next_action_description(&self) -> &str {
        self.stack.next_description()
    }

    /// Drop all history, keeping the current snapshot as the new seed, and
    /// remove the persisted record.
    pub fn clear(&mut self) {
        info!("clearing history");
        self.stack.reset();
        self.persistence.clear();
        self.hub.notify();
    }

    /// Register a callback fired after every mutation (push, undo, redo,
    /// clear). Unsubscribe with the returned id.
    pub fn subscribe(&mut self, listener: impl FnMut() + 'static) -> ListenerId {
        self.hub.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.hub.unsubscribe(id)
    }

    /// Toggle write-through persistence at runtime. Disabling leaves any
    /// already-stored record in place until [`clear`](Self::clear).
    pub fn set_persistence_enabled(&mut self, enabled: bool) {
        self.persistence.set_enabled(enabled);
    }

    /// Read-only view of the timeline. All mutation goes through the
    /// operations above.
    pub fn stack(&self) -> &HistoryStack<S> {
        &self.stack
    }

    pub fn persistence(&self) -> &HistoryPersistence<B> {
        &self.persistence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotebook_store::{MemoryStore, StorageBackend};
    use std::cell::Cell;
    use std::rc::Rc;

    const KEY: &str = "test_manager_history";

    fn manager(initial: &str) -> HistoryManager<String, MemoryStore> {
        HistoryManager::new(
            initial.to_string(),
            MemoryStore::new(),
            KEY,
            HistoryOptions::default(),
        )
    }

    #[test]
    fn undo_returns_snapshot_to_reapply() {
        let mut mgr = manager("v0");
        mgr.track_action("v1".into(), "edit one");
        mgr.track_action("v2".into(), "edit two");

        assert_eq!(mgr.undo().as_deref(), Some("v1"));
        assert_eq!(mgr.undo().as_deref(), Some("v0"));
        assert_eq!(mgr.undo(), None);

        assert_eq!(mgr.redo().as_deref(), Some("v1"));
        assert_eq!(mgr.redo().as_deref(), Some("v2"));
        assert_eq!(mgr.redo(), None);
    }

    #[test]
    fn descriptions_label_the_affordances() {
        let mut mgr = manager("v0");
        mgr.track_action("v1".into(), "Deleted quote #12");

        assert_eq!(mgr.current_action_description(), "Deleted quote #12");
        assert_eq!(mgr.previous_action_description(), crate::INITIAL_DESCRIPTION);
        assert_eq!(mgr.next_action_description(), "");

        mgr.undo();
        assert_eq!(mgr.next_action_description(), "Deleted quote #12");
    }

    #[test]
    fn listener_fires_once_per_mutation_and_stops_after_unsubscribe() {
        let hits = Rc::new(Cell::new(0u32));
        let mut mgr = manager("v0");

        let id = {
            let hits = Rc::clone(&hits);
            mgr.subscribe(move || hits.set(hits.get() + 1))
        };

        mgr.track_action("v1".into(), "one");
        mgr.undo();
        mgr.redo();
        assert_eq!(hits.get(), 3);

        // A refused undo/redo is not a mutation and must not notify.
        mgr.redo();
        assert_eq!(hits.get(), 3);

        assert!(mgr.unsubscribe(id));
        mgr.track_action("v2".into(), "two");
        assert_eq!(hits.get(), 3);
    }

    #[test]
    fn clear_keeps_current_state_and_drops_persisted_record() {
        let mut mgr = manager("v0");
        mgr.track_action("v1".into(), "one");
        mgr.undo();
        assert!(mgr.persistence().backend().contains(KEY));

        mgr.clear();
        assert_eq!(mgr.stack().current_state(), "v0");
        assert!(!mgr.can_undo());
        assert!(!mgr.can_redo());
        assert!(!mgr.persistence().backend().contains(KEY));
    }

    #[test]
    fn rehydrates_from_previously_saved_timeline() {
        let mut first = manager("v0");
        first.track_action("v1".into(), "one");
        first.track_action("v2".into(), "two");
        first.undo();
        let saved = first.persistence().backend().read(KEY).unwrap().unwrap();

        // Simulated restart: a new backend holding the same bytes.
        let mut backend = MemoryStore::new();
        backend.seed(KEY, saved);
        let mgr: HistoryManager<String, _> = HistoryManager::new(
            "ignored-initial".into(),
            backend,
            KEY,
            HistoryOptions::default(),
        );

        assert_eq!(mgr.stack().current_state(), "v1");
        assert!(mgr.can_undo());
        assert!(mgr.can_redo());
        assert_eq!(mgr.next_action_description(), "two");
    }

    #[test]
    fn corrupt_saved_timeline_falls_back_to_fresh_seed() {
        let mut backend = MemoryStore::new();
        backend.seed(KEY, "not json at all");
        let mut mgr: HistoryManager<String, _> =
            HistoryManager::new("fresh".into(), backend, KEY, HistoryOptions::default());

        assert_eq!(mgr.stack().current_state(), "fresh");
        assert!(!mgr.can_undo());

        // Still fully functional afterwards.
        mgr.track_action("next".into(), "first real action");
        assert_eq!(mgr.undo().as_deref(), Some("fresh"));
    }

    #[test]
    fn storage_write_failures_never_reach_the_caller() {
        let mut mgr: HistoryManager<String, _> = HistoryManager::new(
            "v0".into(),
            MemoryStore::failing(),
            KEY,
            HistoryOptions::default(),
        );

        mgr.track_action("v1".into(), "one");
        assert_eq!(mgr.undo().as_deref(), Some("v0"));
        // In-memory timeline stays authoritative for this run.
        assert_eq!(mgr.redo().as_deref(), Some("v1"));
    }

    #[test]
    fn capacity_option_bounds_retained_history() {
        let options = HistoryOptions {
            capacity: 3,
            persistence_enabled: false,
        };
        let mut mgr: HistoryManager<u32, _> =
            HistoryManager::new(0, MemoryStore::new(), KEY, options);

        for n in 1..=10 {
            mgr.track_action(n, format!("step {n}"));
        }
        assert_eq!(mgr.stack().len(), 3);
        assert_eq!(mgr.undo(), Some(9));
        assert_eq!(mgr.undo(), Some(8));
        assert_eq!(mgr.undo(), None);
    }
}
