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

//! The queue of deferred batch-load requests.

use larder_core::{
    callbacks::OnLoad,
    loader::LoaderId,
    resource::{ResourceHandle, ResourceKey},
};
use std::{
    fmt,
    sync::{Mutex, PoisonError},
};

/// One path to preload, with an optional callback for its resolved value.
pub struct PreloadItem {
    /// The path to load.
    pub key: ResourceKey,
    /// Called with the value once the path resolves.
    pub on_load: Option<OnLoad>,
}

impl PreloadItem {
    /// A bare path with no callback.
    pub fn new(key: impl Into<ResourceKey>) -> Self {
        Self {
            key: key.into(),
            on_load: None,
        }
    }

    /// A path whose resolved value is handed to `on_load`.
    pub fn with_on_load(
        key: impl Into<ResourceKey>,
        on_load: impl FnOnce(ResourceHandle) + Send + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            on_load: Some(Box::new(on_load)),
        }
    }
}

impl From<&str> for PreloadItem {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for PreloadItem {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl From<ResourceKey> for PreloadItem {
    fn from(key: ResourceKey) -> Self {
        Self::new(key)
    }
}

impl fmt::Debug for PreloadItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreloadItem")
            .field("key", &self.key)
            .field("on_load", &self.on_load.is_some())
            .finish()
    }
}

/// A batch of paths to be loaded through one loader.
#[derive(Debug)]
pub struct PendingRequest {
    /// The loader every item goes through.
    pub loader: LoaderId,
    /// The paths, in the order they were given.
    pub items: Vec<PreloadItem>,
}

/// Accumulates [`PendingRequest`]s until a batch drain consumes them.
///
/// Requests are drained as a stack: the most recent one comes out first.
/// Every request is handed out exactly once.
#[derive(Debug, Default)]
pub struct PendingQueue {
    requests: Mutex<Vec<PendingRequest>>,
}

impl PendingQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a request.
    pub fn push(&self, request: PendingRequest) {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(request);
    }

    /// Removes and returns the most recently pushed request.
    pub fn pop(&self) -> Option<PendingRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).pop()
    }

    /// Number of queued requests.
    pub fn len(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
