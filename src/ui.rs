//! UI selection scratchpad
//!
//! A free-form key/value map for UI-level state (last opened tab, expanded
//! panels, ...). It has its own lifecycle, independent of the commit store,
//! and is persisted verbatim on every change.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tracing::{debug, warn};

use crate::state::{load_typed, save_typed, DocumentStore, UI_SELECTIONS_KEY};

pub type Selections = BTreeMap<String, Value>;

pub struct SelectionStore {
    documents: Arc<dyn DocumentStore>,
    selections: Mutex<Selections>,
}

impl SelectionStore {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        let selections = match load_typed::<Selections>(documents.as_ref(), UI_SELECTIONS_KEY) {
            Ok(loaded) => loaded.unwrap_or_default(),
            Err(e) => {
                warn!("Ignoring unreadable UI selections: {:#}", e);
                Selections::new()
            }
        };
        debug!("Loaded {} UI selections", selections.len());

        Self {
            documents,
            selections: Mutex::new(selections),
        }
    }

    fn selections(&self) -> MutexGuard<'_, Selections> {
        self.selections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_selection(&self, key: impl Into<String>, value: Value) {
        let mut selections = self.selections();
        selections.insert(key.into(), value);
        self.persist(&selections);
    }

    pub fn get_selection(&self, key: &str) -> Option<Value> {
        self.selections().get(key).cloned()
    }

    /// Clear one key, or every key when `key` is `None`
    pub fn clear_selection(&self, key: Option<&str>) {
        let mut selections = self.selections();
        match key {
            Some(key) => {
                selections.remove(key);
            }
            None => selections.clear(),
        }
        self.persist(&selections);
    }

    pub fn all(&self) -> Selections {
        self.selections().clone()
    }

    fn persist(&self, selections: &Selections) {
        if let Err(e) = save_typed(self.documents.as_ref(), UI_SELECTIONS_KEY, selections) {
            warn!("Failed to persist UI selections: {:#}", e);
        }
    }
}
