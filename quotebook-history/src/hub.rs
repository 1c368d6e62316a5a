//! Change notification: an ordered registry of callbacks fired after every
//! history mutation, keeping the manager free of any UI framework.

use tracing::trace;

/// Handle identifying one registered listener; pass it back to
/// [`NotificationHub::unsubscribe`] to remove exactly that listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Ordered list of zero-argument callbacks.
///
/// Delivery is synchronous and in registration order. Listeners must not
/// panic: an unwinding listener aborts delivery to listeners registered after
/// it, which the manager does not defend against.
#[derive(Default)]
pub struct NotificationHub {
    listeners: Vec<(ListenerId, Box<dyn FnMut()>)>,
    next_id: u64,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; the returned id unsubscribes it later.
    pub fn subscribe(&mut self, listener: impl FnMut() + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        trace!(id = id.0, total = self.listeners.len(), "listener subscribed");
        id
    }

    /// Remove the listener registered under `id`. Returns false if it was
    /// already removed (unsubscribing twice is harmless).
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Invoke every registered listener, in registration order.
    pub fn notify(&mut self) {
        trace!(count = self.listeners.len(), "notifying listeners");
        for (_, listener) in &mut self.listeners {
            listener();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationHub")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
