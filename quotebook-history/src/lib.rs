//! quotebook-history: bounded undo/redo over whole-state snapshots.
//!
//! Design rules:
//! - State is opaque: anything `Clone + Serialize + Deserialize` can be
//!   tracked; the manager never looks inside a snapshot.
//! - One linear timeline with a cursor. Pushing after an undo discards the
//!   abandoned future; capacity caps retained entries, oldest out first.
//! - Persistence is best-effort write-through: storage failures degrade to
//!   "no history across restarts" and never surface to callers.
//! - Everything is synchronous and single-threaded; callers apply the
//!   snapshots that `undo`/`redo` return.

pub mod hub;
pub mod manager;
pub mod persist;
pub mod scoped;
pub mod shared;
pub mod stack;

/// Default number of retained snapshots.
pub const DEFAULT_CAPACITY: usize = 50;

/// Description carried by the seed entry every timeline starts from.
pub const INITIAL_DESCRIPTION: &str = "Initial state";

pub use hub::{ListenerId, NotificationHub};
pub use manager::{HistoryManager, HistoryOptions};
pub use persist::{HistoryPersistence, PersistedHistoryV1};
pub use scoped::ScopedHistory;
pub use shared::{SharedHistory, PROCESSING_DEBOUNCE, SHARED_HISTORY_KEY};
pub use stack::{HistoryEntry, HistoryStack, RestoreError};
