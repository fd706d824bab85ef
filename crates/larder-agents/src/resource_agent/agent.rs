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

//! The ResourceAgent is responsible for loading, caching and batching resources.

use std::{
    collections::HashSet,
    sync::{Arc, PoisonError, RwLock},
};

use futures::{
    future::{join_all, BoxFuture},
    FutureExt,
};
use larder_core::{
    callbacks::{BatchConfig, CallbackDefaults, OnError, OnLoadProgress, OnProgress},
    error::{LoadError, ResourceError},
    loader::{LoaderId, ProgressSink, ResourceLoader},
    resource::{Resource, ResourceHandle, ResourceKey},
};
use larder_data::{
    CacheEntry, CacheLookup, InFlight, PendingQueue, PendingRequest, PreloadItem, ResourceCache,
};
use larder_telemetry::{LoaderMetrics, MetricsSnapshot, ScopedMetricTimer};

use super::batch::{self, BatchContext};
use super::registry::{ErasedLoader, LoaderRegistry};

/// The service object owning every piece of resource state.
///
/// Cloning an agent is cheap and yields a handle to the same cache, queue and
/// registry, so callbacks can capture a clone and re-enter it (for instance to
/// [`preload`](Self::preload) follow-up work from an `on_load`).
///
/// No lock is held while user callbacks run or across an `.await`.
#[derive(Clone)]
pub struct ResourceAgent {
    cache: Arc<ResourceCache>,
    queue: Arc<PendingQueue>,
    loaders: Arc<LoaderRegistry>,
    defaults: Arc<RwLock<CallbackDefaults>>,
    metrics: Arc<LoaderMetrics>,
}

impl Default for ResourceAgent {
    fn default() -> Self {
        Self::new()
    }
}

// Cache access
impl ResourceAgent {
    /// Creates an agent with an empty cache, queue and registry.
    pub fn new() -> Self {
        let metrics = Arc::new(LoaderMetrics::new());
        Self {
            cache: Arc::new(ResourceCache::new()),
            queue: Arc::new(PendingQueue::new()),
            loaders: Arc::new(LoaderRegistry::new(metrics.clone())),
            defaults: Arc::new(RwLock::new(CallbackDefaults::default())),
            metrics,
        }
    }

    /// Stores `handle` under `key`, overwriting any entry, loading ones included.
    pub fn add(&self, key: impl Into<ResourceKey>, handle: ResourceHandle) {
        self.cache.add(key, handle);
    }

    /// Returns the entry for `key`, which may be the loading placeholder.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.cache.get(key)
    }

    /// Returns the resolved value for `key`, if any.
    pub fn get_ready(&self, key: &str) -> Option<ResourceHandle> {
        self.cache.get_ready(key)
    }

    /// Returns the resolved value for `key` if it is a `T`.
    pub fn get_as<T: Resource>(&self, key: &str) -> Option<Arc<T>> {
        self.get_ready(key)?.downcast::<T>()
    }

    /// Removes every listed key; missing keys are ignored.
    pub fn remove<I, K>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        self.cache.remove(keys)
    }

    /// Direct access to the underlying cache.
    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    /// Number of preload requests waiting for the next drain.
    pub fn pending_requests(&self) -> usize {
        self.queue.len()
    }

    /// Current loader metrics.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

// Loader lifecycle and default callbacks
impl ResourceAgent {
    /// Registers a default-constructible loader under `id`.
    pub fn register_loader<L: ResourceLoader + Default>(&self, id: impl Into<LoaderId>) {
        self.loaders.register::<L>(id);
    }

    /// Registers a loader built by `factory` under `id`.
    pub fn register_loader_with<L, F>(&self, id: impl Into<LoaderId>, factory: F)
    where
        L: ResourceLoader,
        F: Fn() -> L + Send + Sync + 'static,
    {
        self.loaders.register_with(id, factory);
    }

    /// Returns the memoized loader instance for `id`, building it on first use.
    pub fn get_loader(&self, id: &str) -> Result<Arc<dyn ErasedLoader>, ResourceError> {
        self.loaders.get_loader(id)
    }

    /// Evicts the loader instance for `id` so the next use builds a fresh one.
    pub fn remove_loader(&self, id: &str) -> bool {
        self.loaders.remove_loader(id)
    }

    /// Removes the loader registered as `id` altogether.
    pub fn unregister_loader(&self, id: &str) -> bool {
        self.loaders.unregister(id)
    }

    /// The loader registry.
    pub fn loaders(&self) -> &LoaderRegistry {
        &self.loaders
    }

    /// Sets the progress callback used by batches that do not supply one.
    pub fn set_on_progress_default(&self, on_progress: Option<OnProgress>) {
        self.defaults.write().unwrap_or_else(PoisonError::into_inner).on_progress = on_progress;
    }

    /// Sets the error callback used by batches that do not supply one.
    pub fn set_on_error_default(&self, on_error: Option<OnError>) {
        self.defaults.write().unwrap_or_else(PoisonError::into_inner).on_error = on_error;
    }
}

// Loading
impl ResourceAgent {
    /// Loads a single resource right away, bypassing the pending queue.
    ///
    /// 1. A resolved key is returned from the cache without calling any loader.
    /// 2. A key that is already loading joins that load and returns its outcome.
    /// 3. Otherwise the key is marked as loading and the loader is invoked.
    ///
    /// A loader failure evicts the key, is reported to `on_error` and yields
    /// `Ok(None)`. Every caller waiting on the same load gets the failure on
    /// its own `on_error`.
    ///
    /// `on_progress` receives the loader's raw progress events. A call that
    /// joins a running load ignores it: the events go to the caller that
    /// started the load.
    ///
    /// # Errors
    /// Returns [`ResourceError::UnknownLoader`] if `loader` is not registered
    /// and the key is not cached.
    pub async fn load(
        &self,
        loader: &str,
        path: impl Into<ResourceKey>,
        on_progress: Option<OnLoadProgress>,
        on_error: Option<OnError>,
    ) -> Result<Option<ResourceHandle>, ResourceError> {
        let key = path.into();

        match self.cache.get(key.as_str()) {
            Some(CacheEntry::Ready(handle)) => {
                self.metrics.cache_hits.increment();
                log::debug!("Cache hit for '{}'", key);
                return Ok(Some(handle));
            }
            Some(CacheEntry::Loading(in_flight)) => {
                log::debug!("Joining in-flight load of '{}'", key);
                return Ok(settle(in_flight.await, on_error.as_ref()));
            }
            None => {}
        }

        let loader = self.loaders.get_loader(loader)?;
        let lookup = self.cache.get_or_start(&key, || {
            self.start_load(loader, key.clone(), ProgressSink::from(on_progress))
        });

        Ok(match lookup {
            CacheLookup::Ready(handle) => Some(handle),
            CacheLookup::Loading(in_flight) | CacheLookup::Started(in_flight) => {
                settle(in_flight.await, on_error.as_ref())
            }
        })
    }

    /// Queues `items` to be loaded through `loader` by the next
    /// [`load_pending`](Self::load_pending).
    ///
    /// Each item is a bare path or a [`PreloadItem`] carrying an `on_load`
    /// callback.
    ///
    /// # Errors
    /// Returns [`ResourceError::UnknownLoader`] if `loader` is not registered.
    pub fn preload<I>(&self, loader: impl Into<LoaderId>, items: I) -> Result<(), ResourceError>
    where
        I: IntoIterator,
        I::Item: Into<PreloadItem>,
    {
        let loader = loader.into();
        if !self.loaders.is_registered(loader.as_str()) {
            return Err(ResourceError::UnknownLoader(loader));
        }

        let items: Vec<PreloadItem> = items.into_iter().map(Into::into).collect();
        log::debug!("Queued {} path(s) for loader '{}'", items.len(), loader);
        self.queue.push(PendingRequest { loader, items });
        Ok(())
    }

    /// Drains the pending queue and loads everything that is not cached yet.
    ///
    /// Paths already resolved get their `on_load` immediately. Absent paths
    /// each become one load operation; all operations run concurrently and the
    /// progress callback receives `completed / total` once per settled
    /// operation, failures included. Paths that are already loading wait for
    /// that load without counting toward the progress; a failure of a load
    /// started elsewhere still reaches the error callback.
    ///
    /// Loader failures never fail the batch: they evict the key and go to the
    /// error callback. Callbacks missing from `config` fall back to the agent
    /// defaults.
    ///
    /// # Errors
    /// Returns [`ResourceError::UnknownLoader`] after every other operation has
    /// settled if a queued request names a loader that was unregistered in the
    /// meantime. That request is skipped.
    pub async fn load_pending(&self, config: BatchConfig) -> Result<(), ResourceError> {
        let config = self
            .defaults
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .resolve(config);
        let on_error = config.on_error;
        let context = Arc::new(BatchContext::new(config.on_progress));

        let mut operations: Vec<BoxFuture<'static, ()>> = Vec::new();
        let mut misuse: Option<ResourceError> = None;
        let mut cache_hits = 0usize;
        let mut owned: HashSet<ResourceKey> = HashSet::new();

        // Callbacks fired below may queue more work; it is picked up as long
        // as it lands before the queue is seen empty.
        while let Some(request) = self.queue.pop() {
            let loader = match self.loaders.get_loader(request.loader.as_str()) {
                Ok(loader) => loader,
                Err(err) => {
                    log::error!("Skipping {} queued path(s): {}", request.items.len(), err);
                    if misuse.is_none() {
                        misuse = Some(err);
                    }
                    continue;
                }
            };

            for PreloadItem { key, on_load } in request.items {
                let lookup = self.cache.get_or_start(&key, || {
                    self.start_load(loader.clone(), key.clone(), ProgressSink::none())
                });

                match lookup {
                    CacheLookup::Ready(handle) => {
                        cache_hits += 1;
                        self.metrics.cache_hits.increment();
                        if let Some(on_load) = on_load {
                            on_load(handle);
                        }
                    }
                    CacheLookup::Loading(in_flight) => {
                        // A duplicate of this batch's own load is reported by
                        // its operation.
                        let on_error = if owned.contains(&key) {
                            None
                        } else {
                            on_error.clone()
                        };
                        operations.push(batch::follow(in_flight, on_load, on_error));
                    }
                    CacheLookup::Started(in_flight) => {
                        context.register_operation();
                        owned.insert(key);
                        operations.push(batch::operation(
                            context.clone(),
                            in_flight,
                            on_load,
                            on_error.clone(),
                        ));
                    }
                }
            }
        }

        if operations.is_empty() {
            log::debug!("Nothing to load ({} cached)", cache_hits);
        } else {
            log::info!(
                "Loading {} resource(s) ({} already cached)",
                context.total(),
                cache_hits
            );
            join_all(operations).await;
            log::info!("Batch of {} resource(s) settled", context.total());
        }
        self.metrics.batches_completed.increment();

        match misuse {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Builds the shared future that runs `loader` for `key` and records the
    /// outcome in the cache. It does nothing until first polled.
    ///
    /// Callbacks are left to the waiters, so each one reports the outcome
    /// exactly once however many share the load.
    fn start_load(
        &self,
        loader: Arc<dyn ErasedLoader>,
        key: ResourceKey,
        progress: ProgressSink,
    ) -> InFlight {
        let cache = self.cache.clone();
        let metrics = self.metrics.clone();

        async move {
            metrics.loads_started.increment();
            let outcome = {
                let _timer = ScopedMetricTimer::new(&metrics.load_time_ms);
                loader.load_erased(&key, &progress).await
            };

            match outcome {
                Ok(handle) => {
                    log::debug!("Loaded '{}'", key);
                    metrics.loads_succeeded.increment();
                    cache.add(key, handle.clone());
                    Ok(handle)
                }
                Err(err) => {
                    log::warn!("Failed to load '{}': {}", key, err);
                    metrics.loads_failed.increment();
                    cache.remove([&key]);
                    Err(err)
                }
            }
        }
        .boxed()
        .shared()
    }
}

/// Turns a shared outcome into the caller's result, reporting a failure to
/// the caller's own `on_error`.
fn settle(
    outcome: Result<ResourceHandle, LoadError>,
    on_error: Option<&OnError>,
) -> Option<ResourceHandle> {
    match outcome {
        Ok(handle) => Some(handle),
        Err(err) => {
            if let Some(on_error) = on_error {
                on_error(&err);
            }
            None
        }
    }
}
