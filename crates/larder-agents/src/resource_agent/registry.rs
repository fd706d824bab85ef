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

//! A registry of loader factories that memoizes one instance per loader id.

use futures::future::BoxFuture;
use larder_core::{
    error::{LoadError, ResourceError},
    loader::{LoaderId, ProgressSink, ResourceLoader},
    resource::{ResourceHandle, ResourceKey},
};
use larder_telemetry::LoaderMetrics;
use std::{
    any::Any,
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock},
};

/// Object-safe view of a [`ResourceLoader`] whose output type is erased.
pub trait ErasedLoader: Send + Sync {
    /// Runs the underlying loader and wraps its output in a [`ResourceHandle`].
    fn load_erased<'a>(
        &'a self,
        path: &'a ResourceKey,
        progress: &'a ProgressSink,
    ) -> BoxFuture<'a, Result<ResourceHandle, LoadError>>;

    /// The concrete loader, for callers that need to reach its own state.
    fn as_any(&self) -> &dyn Any;
}

/// Wraps a typed `ResourceLoader` and implements `ErasedLoader`.
struct LoaderWrapper<L>(L);

impl<L: ResourceLoader> ErasedLoader for LoaderWrapper<L> {
    fn load_erased<'a>(
        &'a self,
        path: &'a ResourceKey,
        progress: &'a ProgressSink,
    ) -> BoxFuture<'a, Result<ResourceHandle, LoadError>> {
        Box::pin(async move {
            let resource = self.0.load(path, progress).await?;
            Ok(ResourceHandle::new(resource))
        })
    }

    fn as_any(&self) -> &dyn Any {
        &self.0
    }
}

type LoaderFactory = Arc<dyn Fn() -> Arc<dyn ErasedLoader> + Send + Sync>;

/// Maps loader ids to factories and lazily builds one instance per id.
///
/// The same id yields the same instance until [`LoaderRegistry::remove_loader`]
/// evicts it, so loaders can keep decoders or connections alive across calls.
pub struct LoaderRegistry {
    factories: RwLock<HashMap<LoaderId, LoaderFactory>>,
    instances: Mutex<HashMap<LoaderId, Arc<dyn ErasedLoader>>>,
    metrics: Arc<LoaderMetrics>,
}

impl LoaderRegistry {
    /// Creates an empty registry reporting into `metrics`.
    pub fn new(metrics: Arc<LoaderMetrics>) -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
            instances: Mutex::new(HashMap::new()),
            metrics,
        }
    }

    /// Registers a default-constructible loader under `id`.
    pub fn register<L: ResourceLoader + Default>(&self, id: impl Into<LoaderId>) {
        self.register_with(id, L::default);
    }

    /// Registers `factory` under `id`.
    ///
    /// Re-registering an id replaces its factory and drops any instance built
    /// by the previous one.
    pub fn register_with<L, F>(&self, id: impl Into<LoaderId>, factory: F)
    where
        L: ResourceLoader,
        F: Fn() -> L + Send + Sync + 'static,
    {
        let id = id.into();
        let factory: LoaderFactory =
            Arc::new(move || Arc::new(LoaderWrapper(factory())) as Arc<dyn ErasedLoader>);

        let replaced = self
            .factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), factory)
            .is_some();
        self.instances().remove(&id);

        if replaced {
            log::warn!("Replaced the loader factory registered as '{}'", id);
        } else {
            log::debug!(
                "Registered loader '{}' producing {}",
                id,
                std::any::type_name::<L::Output>()
            );
        }
    }

    /// Checks whether a factory exists for `id`.
    pub fn is_registered(&self, id: &str) -> bool {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// Returns the memoized loader for `id`, building it on first use.
    ///
    /// # Errors
    /// Returns [`ResourceError::UnknownLoader`] if nothing is registered as `id`.
    pub fn get_loader(&self, id: &str) -> Result<Arc<dyn ErasedLoader>, ResourceError> {
        if let Some(loader) = self.instances().get(id) {
            return Ok(loader.clone());
        }

        let factory = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| ResourceError::UnknownLoader(LoaderId::new(id)))?;

        // The factory is user code: run it without holding any registry lock.
        let created = factory();

        let mut instances = self.instances();
        let loader = instances
            .entry(LoaderId::new(id))
            .or_insert_with(|| {
                self.metrics.loaders_created.increment();
                log::debug!("Instantiated loader '{}'", id);
                created
            })
            .clone();
        Ok(loader)
    }

    /// Evicts the instance for `id`; the next [`get_loader`](Self::get_loader)
    /// builds a fresh one. Returns whether an instance was evicted.
    pub fn remove_loader(&self, id: &str) -> bool {
        let removed = self.instances().remove(id).is_some();
        if removed {
            log::debug!("Evicted loader instance '{}'", id);
        }
        removed
    }

    /// Forgets the factory and any live instance for `id`. Requests already
    /// queued for it fail when drained. Returns whether a factory was removed.
    pub fn unregister(&self, id: &str) -> bool {
        let removed = self
            .factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some();
        self.instances().remove(id);
        if removed {
            log::debug!("Unregistered loader '{}'", id);
        }
        removed
    }

    /// Number of live loader instances.
    pub fn instance_count(&self) -> usize {
        self.instances().len()
    }

    fn instances(&self) -> MutexGuard<'_, HashMap<LoaderId, Arc<dyn ErasedLoader>>> {
        self.instances.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::new(Arc::new(LoaderMetrics::new()))
    }
}
