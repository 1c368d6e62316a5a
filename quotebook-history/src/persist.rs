//! Best-effort persistence of the history timeline.
//!
//! The in-memory stack is always the source of truth for the current run;
//! storage failures are logged and swallowed so a full quota or missing
//! storage area degrades to "no history across restarts", never an error in
//! the caller's face.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use quotebook_store::StorageBackend;

use crate::stack::{HistoryEntry, HistoryStack};

/// The stored record shape. Field names are part of the wire format and must
/// stay stable across versions so restarts keep finding old data.
#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedHistoryV1<S> {
    pub history: Vec<HistoryEntry<S>>,
    #[serde(rename = "historyIndex")]
    pub history_index: usize,
}

/// Borrowed serialization view, so saving never clones the timeline.
#[derive(Serialize)]
struct PersistedViewV1<'a, S> {
    history: &'a [HistoryEntry<S>],
    #[serde(rename = "historyIndex")]
    history_index: usize,
}

/// Saves and restores a [`HistoryStack`] under one fixed storage key.
#[derive(Debug)]
pub struct HistoryPersistence<B> {
    backend: B,
    key: String,
    enabled: bool,
}

impl<B: StorageBackend> HistoryPersistence<B> {
    pub fn new(backend: B, key: impl Into<String>, enabled: bool) -> Self {
        Self {
            backend,
            key: key.into(),
            enabled,
        }
    }

    /// Write the stack's `{entries, cursor}` to storage. No-op while
    /// disabled; failures are logged and swallowed.
    pub fn save<S: Serialize>(&mut self, stack: &HistoryStack<S>) {
        if !self.enabled {
            return;
        }

        let record = PersistedViewV1 {
            history: stack.entries(),
            history_index: stack.cursor(),
        };
        let text = match serde_json::to_string(&record) {
            Ok(text) => text,
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to serialize history");
                return;
            }
        };
        if let Err(e) = self.backend.write(&self.key, &text) {
            warn!(key = %self.key, error = %e, "failed to persist history");
        } else {
            debug!(key = %self.key, entries = stack.len(), "history persisted");
        }
    }

    /// Read and validate a previously saved timeline. Absent, unreadable, or
    /// corrupt data all yield `None`: the caller starts from a fresh seed.
    pub fn load<S: DeserializeOwned>(&self, capacity: usize) -> Option<HistoryStack<S>> {
        let text = match self.backend.read(&self.key) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to read saved history");
                return None;
            }
        };

        let record: PersistedHistoryV1<S> = match serde_json::from_str(&text) {
            Ok(record) => record,
            Err(e) => {
                warn!(key = %self.key, error = %e, "saved history is corrupt, starting fresh");
                return None;
            }
        };

        match HistoryStack::from_parts(record.history, record.history_index, capacity) {
            Ok(stack) => {
                info!(key = %self.key, entries = stack.len(), cursor = stack.cursor(),
                    "restored history from storage");
                Some(stack)
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "saved history is inconsistent, starting fresh");
                None
            }
        }
    }

    /// Remove the stored record. Works even while persistence is disabled;
    /// disabling only stops new writes, it does not touch old data.
    pub fn clear(&mut self) {
        if let Err(e) = self.backend.remove(&self.key) {
            warn!(key = %self.key, error = %e, "failed to remove persisted history");
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotebook_store::MemoryStore;

    const KEY: &str = "test_history";

    #[test]
    fn save_then_load_restores_entries_and_cursor() {
        let mut stack = HistoryStack::new("a".to_string());
        stack.push("b".to_string(), "made b");
        stack.push("c".to_string(), "made c");
        stack.undo();

        let mut persistence = HistoryPersistence::new(MemoryStore::new(), KEY, true);
        persistence.save(&stack);

        let restored: HistoryStack<String> = persistence.load(stack.capacity()).unwrap();
        assert_eq!(restored.entries(), stack.entries());
        assert_eq!(restored.cursor(), 1);
    }

    #[test]
    fn load_with_nothing_saved_is_none() {
        let persistence = HistoryPersistence::new(MemoryStore::new(), KEY, true);
        assert!(persistence.load::<String>(50).is_none());
    }

    #[test]
    fn corrupt_text_loads_as_none() {
        let mut backend = MemoryStore::new();
        backend.seed(KEY, "{\"history\": [truncated");
        let persistence = HistoryPersistence::new(backend, KEY, true);
        assert!(persistence.load::<String>(50).is_none());
    }

    #[test]
    fn out_of_range_cursor_loads_as_none() {
        let mut backend = MemoryStore::new();
        backend.seed(
            KEY,
            r#"{"history":[{"state":"a","description":"Initial state"}],"historyIndex":7}"#,
        );
        let persistence = HistoryPersistence::new(backend, KEY, true);
        assert!(persistence.load::<String>(50).is_none());
    }

    #[test]
    fn disabled_persistence_writes_nothing() {
        let stack = HistoryStack::new("a".to_string());
        let mut persistence = HistoryPersistence::new(MemoryStore::new(), KEY, false);
        persistence.save(&stack);
        assert!(!persistence.backend().contains(KEY));
    }

    #[test]
    fn write_failure_is_swallowed() {
        let stack = HistoryStack::new("a".to_string());
        let mut persistence = HistoryPersistence::new(MemoryStore::failing(), KEY, true);
        // Must not panic or propagate.
        persistence.save(&stack);
        persistence.clear();
    }

    #[test]
    fn clear_removes_saved_record() {
        let stack = HistoryStack::new("a".to_string());
        let mut persistence = HistoryPersistence::new(MemoryStore::new(), KEY, true);
        persistence.save(&stack);
        assert!(persistence.backend().contains(KEY));

        // Disabling does not remove data; clear does.
        persistence.set_enabled(false);
        assert!(persistence.backend().contains(KEY));
        persistence.clear();
        assert!(!persistence.backend().contains(KEY));
    }

    #[test]
    fn wire_format_uses_fixed_field_names() {
        let mut stack = HistoryStack::new(1u32);
        stack.push(2, "bump");

        let mut persistence = HistoryPersistence::new(MemoryStore::new(), KEY, true);
        persistence.save(&stack);

        let raw = persistence.backend().read(KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.get("history").is_some());
        assert_eq!(value.get("historyIndex").unwrap(), 1);
    }
}
