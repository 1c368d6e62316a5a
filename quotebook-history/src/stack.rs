//! The linear undo/redo timeline: ordered snapshots plus a cursor.
//!
//! Pure in-memory logic; persistence and change notification live elsewhere.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::{DEFAULT_CAPACITY, INITIAL_DESCRIPTION};

/// One recorded snapshot: the full tracked state at a point in time plus a
/// human-readable label for the action that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry<S> {
    pub state: S,
    pub description: String,
}

/// Bounded linear history of whole-state snapshots.
///
/// Invariants: at least one entry is always present, `cursor` always indexes
/// a live entry, and `entries.len() <= capacity`. Entries past the cursor are
/// the redo branch; pushing while a redo branch exists discards it whole.
#[derive(Debug, Clone)]
pub struct HistoryStack<S> {
    entries: Vec<HistoryEntry<S>>,
    cursor: usize,
    capacity: usize,
}

/// Why a persisted `{entries, cursor}` pair could not be turned back into a
/// stack.
#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("persisted history has no entries")]
    Empty,

    #[error("persisted cursor {cursor} out of range for {len} entries")]
    CursorOutOfRange { cursor: usize, len: usize },
}

impl<S> HistoryStack<S> {
    /// Seed a stack with the state at construction time, labeled
    /// [`INITIAL_DESCRIPTION`], using the default capacity.
    pub fn new(initial: S) -> Self {
        Self::with_capacity(initial, DEFAULT_CAPACITY)
    }

    /// Seed a stack with an explicit capacity (clamped to at least 1, since
    /// the current entry must always be retained).
    pub fn with_capacity(initial: S, capacity: usize) -> Self {
        Self {
            entries: vec![HistoryEntry {
                state: initial,
                description: INITIAL_DESCRIPTION.to_string(),
            }],
            cursor: 0,
            capacity: capacity.max(1),
        }
    }

    /// Rebuild a stack from persisted parts. If the persisted run is longer
    /// than `capacity` (the configured limit shrank between runs), the oldest
    /// entries are dropped and the cursor shifted to match.
    pub fn from_parts(
        entries: Vec<HistoryEntry<S>>,
        cursor: usize,
        capacity: usize,
    ) -> Result<Self, RestoreError> {
        if entries.is_empty() {
            return Err(RestoreError::Empty);
        }
        if cursor >= entries.len() {
            return Err(RestoreError::CursorOutOfRange {
                cursor,
                len: entries.len(),
            });
        }

        let capacity = capacity.max(1);
        let mut stack = Self {
            entries,
            cursor,
            capacity,
        };
        if stack.entries.len() > capacity {
            let excess = stack.entries.len() - capacity;
            stack.entries.drain(..excess);
            stack.cursor = stack.cursor.saturating_sub(excess);
            debug!(excess, "trimmed persisted history to capacity");
        }
        Ok(stack)
    }

    /// Record a new snapshot as the new current state.
    ///
    /// Any redo branch is discarded first; if the stack then exceeds its
    /// capacity the oldest entry is evicted. Afterwards the cursor is at the
    /// tail, so `can_redo()` is always false on return.
    pub fn push(&mut self, state: S, description: impl Into<String>) {
        if self.cursor + 1 < self.entries.len() {
            let dropped = self.entries.len() - self.cursor - 1;
            self.entries.truncate(self.cursor + 1);
            debug!(dropped, "discarded redo branch on push");
        }

        self.entries.push(HistoryEntry {
            state,
            description: description.into(),
        });

        if self.entries.len() > self.capacity {
            self.entries.remove(0);
            trace!(capacity = self.capacity, "evicted oldest entry");
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Step the cursor back one entry and return the now-current state.
    /// At the oldest entry this is a no-op returning the unchanged state.
    pub fn undo(&mut self) -> &S {
        if self.cursor > 0 {
            self.cursor -= 1;
            trace!(cursor = self.cursor, "undo");
        }
        &self.entries[self.cursor].state
    }

    /// Step the cursor forward one entry and return the now-current state.
    /// At the newest entry this is a no-op returning the unchanged state.
    pub fn redo(&mut self) -> &S {
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
            trace!(cursor = self.cursor, "redo");
        }
        &self.entries[self.cursor].state
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn current_state(&self) -> &S {
        &self.entries[self.cursor].state
    }

    /// Label of the action that produced the current state.
    pub fn current_description(&self) -> &str {
        &self.entries[self.cursor].description
    }

    /// Label of the entry an undo would land on; empty when there is none.
    /// Suits affordances like "Undo: Deleted quote #12".
    pub fn previous_description(&self) -> &str {
        match self.cursor.checked_sub(1) {
            Some(i) => &self.entries[i].description,
            None => "",
        }
    }

    /// Label of the entry a redo would land on; empty when there is none.
    pub fn next_description(&self) -> &str {
        match self.entries.get(self.cursor + 1) {
            Some(entry) => &entry.description,
            None => "",
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> &[HistoryEntry<S>] {
        &self.entries
    }
}

impl<S: Clone> HistoryStack<S> {
    /// Collapse the timeline to a single seed entry carrying the current
    /// state, so clearing history never changes what the caller sees live.
    pub fn reset(&mut self) {
        let seed = HistoryEntry {
            state: self.entries[self.cursor].state.clone(),
            description: INITIAL_DESCRIPTION.to_string(),
        };
        self.entries = vec![seed];
        self.cursor = 0;
        debug!("history reset to seed entry");
    }
}
