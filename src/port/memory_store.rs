// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory state store.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::StoreError;

use super::PersistentStateStore;

/// A [`PersistentStateStore`] backed by a shared map.
///
/// Clones share the same map, so a test can keep a handle to inspect what
/// was saved, or hand a clone to a second engine to simulate a restart.
///
/// # Examples
///
/// ```
/// use ledlink::port::{MemoryStore, PersistentStateStore};
///
/// let mut store = MemoryStore::new();
/// assert_eq!(store.get("ledPower", 255).unwrap(), 255);
///
/// store.put("ledPower", 10).unwrap();
/// let restarted = store.clone();
/// assert_eq!(restarted.get("ledPower", 255).unwrap(), 10);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, u32>>>,
    unavailable: Arc<Mutex<bool>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored value for `key`, if any.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<u32> {
        self.values.lock().get(key).copied()
    }

    /// Returns the number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    /// Returns `true` if nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }

    /// Makes every subsequent operation fail until re-enabled.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock() = unavailable;
    }

    fn check(&self) -> Result<(), StoreError> {
        if *self.unavailable.lock() {
            return Err(StoreError::Unavailable("memory store disabled".to_string()));
        }
        Ok(())
    }
}

impl PersistentStateStore for MemoryStore {
    fn get(&self, key: &str, default: u32) -> Result<u32, StoreError> {
        self.check()?;
        Ok(self.value(key).unwrap_or(default))
    }

    fn put(&mut self, key: &str, value: u32) -> Result<(), StoreError> {
        self.check()?;
        self.values.lock().insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_returns_default() {
        let store = MemoryStore::new();
        assert_eq!(store.get("ledMode", 1).unwrap(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn clones_share_values() {
        let mut store = MemoryStore::new();
        let handle = store.clone();
        store.put("ledState", 1).unwrap();
        assert_eq!(handle.value("ledState"), Some(1));
        assert_eq!(handle.len(), 1);
    }

    #[test]
    fn unavailable_store_fails() {
        let mut store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.put("ledState", 1),
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.get("ledState", 0).is_err());

        store.set_unavailable(false);
        assert!(store.put("ledState", 1).is_ok());
    }
}
