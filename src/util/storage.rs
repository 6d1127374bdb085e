//! Durable key/value storage for client-local state.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session is persisted key by key in `localStorage`. Code that persists
//! takes a [`KeyValueStore`] so tests can swap in [`MemoryStorage`].

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::cell::RefCell;
use std::collections::HashMap;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    /// Delete `key`. Returns `false` when the store refused; a missing key
    /// counts as removed.
    fn remove(&self, key: &str) -> bool;
}

/// Browser `localStorage`. Outside the browser every call is a no-op.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserStorage;

#[cfg(feature = "hydrate")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        #[cfg(feature = "hydrate")]
        {
            local_storage()?.get_item(key).ok().flatten()
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = key;
            None
        }
    }

    fn set(&self, key: &str, value: &str) {
        #[cfg(feature = "hydrate")]
        {
            let Some(storage) = local_storage() else {
                log::warn!("localStorage unavailable; {key} not persisted");
                return;
            };
            if storage.set_item(key, value).is_err() {
                log::warn!("localStorage rejected write for {key}");
            }
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = (key, value);
        }
    }

    fn remove(&self, key: &str) -> bool {
        #[cfg(feature = "hydrate")]
        {
            let Some(storage) = local_storage() else {
                log::warn!("localStorage unavailable; {key} not removed");
                return false;
            };
            if storage.remove_item(key).is_err() {
                log::warn!("localStorage rejected removal of {key}");
                return false;
            }
            true
        }
        #[cfg(not(feature = "hydrate"))]
        {
            let _ = key;
            true
        }
    }
}

/// In-memory store used natively and in tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.borrow_mut().insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) -> bool {
        self.entries.borrow_mut().remove(key);
        true
    }
}
