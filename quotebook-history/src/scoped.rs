//! Scoped deployment: one history per editing session, owned by its parent
//! and dropped with it. The owner supplies an `on_change` callback and is
//! handed every resulting state to apply back to its live view.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use quotebook_store::{MemoryStore, StorageBackend};

use crate::hub::ListenerId;
use crate::manager::{HistoryManager, HistoryOptions};

/// Session-scoped undo/redo history.
///
/// By default nothing is persisted: the timeline lives and dies with the
/// session. [`with_store`](Self::with_store) opts a session into durable
/// storage under a caller-chosen key, which must differ from the
/// process-wide key (and from other sessions') or the records overwrite
/// each other.
pub struct ScopedHistory<S, B = MemoryStore> {
    session_id: Uuid,
    manager: HistoryManager<S, B>,
    on_change: Box<dyn FnMut(&S)>,
}

impl<S> ScopedHistory<S, MemoryStore>
where
    S: Clone + Serialize + DeserializeOwned,
{
    /// Non-persistent session history seeded with `initial`.
    pub fn new(initial: S, on_change: impl FnMut(&S) + 'static) -> Self {
        let session_id = Uuid::new_v4();
        let options = HistoryOptions {
            persistence_enabled: false,
            ..HistoryOptions::default()
        };
        let key = format!("session_history_{session_id}");
        info!(session_id = %session_id, "scoped history created");
        Self {
            session_id,
            manager: HistoryManager::new(initial, MemoryStore::new(), key, options),
            on_change: Box::new(on_change),
        }
    }
}

impl<S, B> ScopedHistory<S, B>
where
    S: Clone + Serialize + DeserializeOwned,
    B: StorageBackend,
{
    /// Durable session history under `key`, rehydrating any timeline
    /// previously saved there.
    pub fn with_store(
        initial: S,
        on_change: impl FnMut(&S) + 'static,
        backend: B,
        key: impl Into<String>,
        options: HistoryOptions,
    ) -> Self {
        let session_id = Uuid::new_v4();
        info!(session_id = %session_id, "scoped history created with durable store");
        Self {
            session_id,
            manager: HistoryManager::new(initial, backend, key, options),
            on_change: Box::new(on_change),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Record a new snapshot and hand it straight back to the owner.
    pub fn track_action(&mut self, state: S, description: impl Into<String>) {
        self.manager.track_action(state.clone(), description);
        (self.on_change)(&state);
    }

    /// Step back one snapshot; the owner's callback receives the result
    /// before it is returned.
    pub fn undo(&mut self) -> Option<S> {
        let state = self.manager.undo()?;
        (self.on_change)(&state);
        Some(state)
    }

    /// Step forward one snapshot; the owner's callback receives the result
    /// before it is returned.
    pub fn redo(&mut self) -> Option<S> {
        let state = self.manager.redo()?;
        (self.on_change)(&state);
        Some(state)
    }

    pub fn can_undo(&self) -> bool {
        self.manager.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.manager.can_redo()
    }

    pub fn current_action_description(&self) -> &str {
        self.manager.current_action_description()
    }

    pub fn previous_action_description(&self) -> &str {
        self.manager.previous_action_description()
    }

    pub fn next_action_description(&self) -> &str {
        self.manager.next_action_description()
    }

    /// Drop the session's history; the current state stays live, so the
    /// owner's callback is not invoked.
    pub fn clear(&mut self) {
        self.manager.clear();
    }

    pub fn subscribe(&mut self, listener: impl FnMut() + 'static) -> ListenerId {
        self.manager.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.manager.unsubscribe(id)
    }
}

impl<S, B> Drop for ScopedHistory<S, B> {
    fn drop(&mut self) {
        debug!(session_id = %self.session_id, "scoped history dropped");
    }
}
