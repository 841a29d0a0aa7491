//! Per-instance shared state for cooperating plugins
//!
//! A [`SharedCache`] is a string-keyed map of typed slots. Each plugin
//! instance lazily creates the slot it needs on first use, and every hook of
//! that instance sees the same slot for the lifetime of the owning client.
//! Cloning the cache clones the handle, not the contents.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use hookline_common::{Error, Result};

/// String-keyed, type-erased slot store shared by all hooks of a client.
#[derive(Clone, Default)]
pub struct SharedCache {
    slots: Arc<Mutex<HashMap<String, Arc<dyn Any + Send + Sync>>>>,
}

impl SharedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the slot under `key`, creating it with `init` on first access.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SlotTypeMismatch`] when the slot exists but was
    /// created with a different type.
    pub fn get_or_create<T, F>(&self, key: &str, init: F) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let slot = slots
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(init()) as Arc<dyn Any + Send + Sync>);
        Arc::clone(slot)
            .downcast::<T>()
            .map_err(|_| Error::SlotTypeMismatch(key.to_string()))
    }

    /// Drop the slot under `key`, if present.
    pub fn remove(&self, key: &str) -> bool {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for SharedCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("SharedCache")
            .field("keys", &slots.keys().collect::<Vec<_>>())
            .finish()
    }
}
