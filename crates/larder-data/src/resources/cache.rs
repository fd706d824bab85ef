// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A loader-agnostic, in-memory cache keyed by resource path.

use futures::future::{BoxFuture, Shared};
use larder_core::{
    error::LoadError,
    resource::{ResourceHandle, ResourceKey},
};
use std::{
    collections::HashMap,
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
};

/// A load that has started but not settled yet.
///
/// Every clone resolves to the same outcome, so each waiter can report a
/// failure through its own callbacks.
pub type InFlight = Shared<BoxFuture<'static, Result<ResourceHandle, LoadError>>>;

/// The state of a key that is present in the cache.
#[derive(Clone)]
pub enum CacheEntry {
    /// The in-progress placeholder. Awaiting the future joins the running load.
    Loading(InFlight),
    /// The resolved value.
    Ready(ResourceHandle),
}

impl CacheEntry {
    /// Returns `true` for the in-progress placeholder.
    pub fn is_loading(&self) -> bool {
        matches!(self, CacheEntry::Loading(_))
    }

    /// Returns the resolved value, if any.
    pub fn as_ready(&self) -> Option<&ResourceHandle> {
        match self {
            CacheEntry::Ready(handle) => Some(handle),
            CacheEntry::Loading(_) => None,
        }
    }

    /// Converts into the resolved value, if any.
    pub fn into_ready(self) -> Option<ResourceHandle> {
        match self {
            CacheEntry::Ready(handle) => Some(handle),
            CacheEntry::Loading(_) => None,
        }
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheEntry::Loading(_) => f.write_str("Loading"),
            CacheEntry::Ready(handle) => f.debug_tuple("Ready").field(handle).finish(),
        }
    }
}

/// The outcome of [`ResourceCache::get_or_start`].
pub enum CacheLookup {
    /// The key was already resolved.
    Ready(ResourceHandle),
    /// Another load for the key is in flight.
    Loading(InFlight),
    /// The key was absent; the given load now owns it.
    Started(InFlight),
}

/// A central, in-memory cache mapping a [`ResourceKey`] to its [`CacheEntry`].
///
/// A key moves from absent to `Loading` to `Ready`. A failed load removes the
/// key instead, so a later request starts over from absent.
#[derive(Default)]
pub struct ResourceCache {
    entries: Mutex<HashMap<ResourceKey, CacheEntry>>,
}

impl ResourceCache {
    /// Creates a new, empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `handle` under `key`, replacing whatever was there, including a
    /// loading placeholder.
    pub fn add(&self, key: impl Into<ResourceKey>, handle: ResourceHandle) {
        self.lock().insert(key.into(), CacheEntry::Ready(handle));
    }

    /// Returns the entry for `key`, which may be the loading placeholder.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.lock().get(key).cloned()
    }

    /// Returns the value for `key` only if it has resolved.
    pub fn get_ready(&self, key: &str) -> Option<ResourceHandle> {
        self.get(key).and_then(CacheEntry::into_ready)
    }

    /// Checks whether `key` is present in any state.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// Removes every listed key and returns how many were present.
    /// Missing keys are ignored.
    pub fn remove<I, K>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut entries = self.lock();
        keys.into_iter()
            .filter(|key| entries.remove(key.as_ref()).is_some())
            .count()
    }

    /// Looks up `key` and, if it is absent, marks it as loading with the
    /// future produced by `start` in the same critical section.
    ///
    /// `start` must only build the future; it runs while the cache is locked.
    pub fn get_or_start(
        &self,
        key: &ResourceKey,
        start: impl FnOnce() -> InFlight,
    ) -> CacheLookup {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(CacheEntry::Ready(handle)) => CacheLookup::Ready(handle.clone()),
            Some(CacheEntry::Loading(in_flight)) => CacheLookup::Loading(in_flight.clone()),
            None => {
                let in_flight = start();
                entries.insert(key.clone(), CacheEntry::Loading(in_flight.clone()));
                log::trace!("Marked '{}' as loading", key);
                CacheLookup::Started(in_flight)
            }
        }
    }

    /// Number of entries, loading ones included.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if the cache holds nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Entries are never left half-updated while the lock is held, so a
    // poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<ResourceKey, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.lock().iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn in_flight(outcome: Result<ResourceHandle, LoadError>) -> InFlight {
        async move { outcome }.boxed().shared()
    }

    fn failing() -> InFlight {
        in_flight(Err(LoadError::not_found("k")))
    }

    #[test]
    fn test_add_get_and_overwrite() {
        let cache = ResourceCache::new();
        cache.add("a.txt", ResourceHandle::new(1u32));
        cache.add("a.txt", ResourceHandle::new(2u32));

        let value = cache.get_ready("a.txt").unwrap();
        assert_eq!(value.downcast_ref::<u32>(), Some(&2));
        assert_eq!(cache.len(), 1);
        assert!(cache.get("b.txt").is_none());
    }

    #[test]
    fn test_remove_ignores_missing_keys() {
        let cache = ResourceCache::new();
        cache.add("a", ResourceHandle::new(()));
        cache.add("b", ResourceHandle::new(()));

        assert_eq!(cache.remove(["a", "missing"]), 1);
        assert_eq!(cache.remove(Vec::<String>::new()), 0);
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
    }

    #[test]
    fn test_get_or_start_marks_absent_key_once() {
        let cache = ResourceCache::new();
        let key = ResourceKey::new("mesh.obj");

        let first = cache.get_or_start(&key, failing);
        assert!(matches!(first, CacheLookup::Started(_)));
        assert!(cache.get("mesh.obj").unwrap().is_loading());
        assert!(cache.get_ready("mesh.obj").is_none());

        let second = cache.get_or_start(&key, || panic!("key is already loading"));
        assert!(matches!(second, CacheLookup::Loading(_)));
    }

    #[test]
    fn test_get_or_start_returns_ready_value() {
        let cache = ResourceCache::new();
        let handle = ResourceHandle::new("cached");
        cache.add("k", handle.clone());

        match cache.get_or_start(&ResourceKey::new("k"), || panic!("key is resolved")) {
            CacheLookup::Ready(found) => assert!(found.ptr_eq(&handle)),
            _ => panic!("expected a ready value"),
        }
    }

    #[test]
    fn test_add_overwrites_loading_placeholder() {
        let cache = ResourceCache::new();
        let key = ResourceKey::new("k");
        cache.get_or_start(&key, failing);

        cache.add(key.clone(), ResourceHandle::new(7i64));
        assert_eq!(
            cache.get_ready("k").unwrap().downcast_ref::<i64>(),
            Some(&7)
        );
    }

    #[test]
    fn test_loading_entry_joins_shared_outcome() {
        let cache = ResourceCache::new();
        let key = ResourceKey::new("k");
        let handle = ResourceHandle::new(5u8);
        cache.get_or_start(&key, || in_flight(Ok(handle.clone())));

        let Some(CacheEntry::Loading(waiter)) = cache.get("k") else {
            panic!("expected a loading entry");
        };
        let outcome = futures::executor::block_on(waiter);
        assert!(outcome.unwrap().ptr_eq(&handle));
    }

    #[test]
    fn test_every_waiter_sees_the_same_error() {
        let cache = ResourceCache::new();
        let key = ResourceKey::new("k");
        let CacheLookup::Started(owner) = cache.get_or_start(&key, failing) else {
            panic!("expected to start the load");
        };
        let CacheLookup::Loading(joiner) = cache.get_or_start(&key, failing) else {
            panic!("expected to join the load");
        };

        let (first, second) = futures::executor::block_on(futures::future::join(owner, joiner));
        assert_eq!(first.unwrap_err(), LoadError::not_found("k"));
        assert_eq!(second.unwrap_err(), LoadError::not_found("k"));
    }
}
