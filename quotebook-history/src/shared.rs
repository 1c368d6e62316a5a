//! Process-wide deployment: one history for the whole running process,
//! rehydrated from storage at startup and reachable from any call site via a
//! cheap-to-clone handle.
//!
//! The handle is built for a single-threaded, event-driven host (UI
//! callbacks), so interior mutability is `RefCell`, not a lock. Construct it
//! once at startup and pass clones to whoever needs it; there is no ambient
//! global, which keeps tests free to build isolated instances.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use quotebook_store::StorageBackend;

use crate::hub::{ListenerId, NotificationHub};
use crate::manager::{HistoryManager, HistoryOptions};

/// Storage key for the process-wide timeline. Fixed so every restart finds
/// the previous run's record; scoped sessions must use different keys.
pub const SHARED_HISTORY_KEY: &str = "quotebook_action_history";

/// How long [`SharedHistory::is_processing`] stays set after an undo/redo.
/// Purely a UI affordance for debouncing rapid clicks; it never gates the
/// operations themselves.
pub const PROCESSING_DEBOUNCE: Duration = Duration::from_millis(300);

struct SharedInner<S, B> {
    manager: HistoryManager<S, B>,
    last_nav: Option<Instant>,
}

/// Clonable handle to the process-wide history manager.
///
/// Subscribers are registered on the handle itself and fired only after the
/// interior borrow on the timeline is released, so a listener is free to
/// read the history (`can_undo`, descriptions, `current_state`) through a
/// cloned handle while reacting to a change. Listeners must not mutate the
/// history or (un)subscribe from inside a notification.
pub struct SharedHistory<S, B> {
    inner: Rc<RefCell<SharedInner<S, B>>>,
    hub: Rc<RefCell<NotificationHub>>,
}

impl<S, B> Clone for SharedHistory<S, B> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            hub: Rc::clone(&self.hub),
        }
    }
}

impl<S, B> SharedHistory<S, B>
where
    S: Clone + Serialize + DeserializeOwned,
    B: StorageBackend,
{
    /// Open the process-wide history under [`SHARED_HISTORY_KEY`],
    /// rehydrating whatever the previous run saved; `initial` seeds the
    /// timeline when nothing (valid) was stored.
    pub fn open(initial: S, backend: B, options: HistoryOptions) -> Self {
        let manager = HistoryManager::new(initial, backend, SHARED_HISTORY_KEY, options);
        Self {
            inner: Rc::new(RefCell::new(SharedInner {
                manager,
                last_nav: None,
            })),
            hub: Rc::new(RefCell::new(NotificationHub::new())),
        }
    }

    /// Fire handle-level listeners. Called only once the timeline borrow is
    /// back out of scope, so listeners can read through cloned handles.
    fn notify(&self) {
        self.hub.borrow_mut().notify();
    }

    pub fn track_action(&self, state: S, description: impl Into<String>) {
        self.inner
            .borrow_mut()
            .manager
            .track_action(state, description);
        self.notify();
    }

    pub fn undo(&self) -> Option<S> {
        let state = {
            let mut inner = self.inner.borrow_mut();
            let state = inner.manager.undo();
            if state.is_some() {
                inner.last_nav = Some(Instant::now());
            }
            state
        };
        if state.is_some() {
            self.notify();
        }
        state
    }

    pub fn redo(&self) -> Option<S> {
        let state = {
            let mut inner = self.inner.borrow_mut();
            let state = inner.manager.redo();
            if state.is_some() {
                inner.last_nav = Some(Instant::now());
            }
            state
        };
        if state.is_some() {
            self.notify();
        }
        state
    }

    pub fn can_undo(&self) -> bool {
        self.inner.borrow().manager.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.inner.borrow().manager.can_redo()
    }

    pub fn current_action_description(&self) -> String {
        self.inner.borrow().manager.current_action_description().to_string()
    }

    pub fn previous_action_description(&self) -> String {
        self.inner.borrow().manager.previous_action_description().to_string()
    }

    pub fn next_action_description(&self) -> String {
        self.inner.borrow().manager.next_action_description().to_string()
    }

    /// Current snapshot, cloned out of the timeline.
    pub fn current_state(&self) -> S {
        self.inner.borrow().manager.stack().current_state().clone()
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().manager.clear();
        self.notify();
    }

    /// Register a callback fired after every mutation, once the timeline is
    /// readable again.
    pub fn subscribe(&self, listener: impl FnMut() + 'static) -> ListenerId {
        self.hub.borrow_mut().subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.hub.borrow_mut().unsubscribe(id)
    }

    pub fn set_persistence_enabled(&self, enabled: bool) {
        self.inner
            .borrow_mut()
            .manager
            .set_persistence_enabled(enabled);
    }

    /// True for a short window after an undo/redo so UI can grey out the
    /// controls against rapid repeat clicks. Cosmetic only: operations
    /// issued inside the window still execute normally.
    pub fn is_processing(&self) -> bool {
        self.inner
            .borrow()
            .last_nav
            .is_some_and(|t| t.elapsed() < PROCESSING_DEBOUNCE)
    }
}
