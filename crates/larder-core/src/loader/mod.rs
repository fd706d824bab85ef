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

//! The contract every resource loader implements.
//!
//! A loader is an external collaborator that knows how to fetch and decode a
//! single kind of resource from a path. The cache and batch machinery only
//! ever talk to loaders through [`ResourceLoader`].

mod progress;

pub use progress::*;

use crate::{error::LoadError, resource::Resource, resource::ResourceKey};
use async_trait::async_trait;
use std::{borrow::Borrow, fmt};

/// Names a loader "class" in the loader registry.
///
/// Each id maps to exactly one factory, and the registry keeps at most one
/// live instance per id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoaderId(String);

impl LoaderId {
    /// Creates a loader id from any string-like name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for LoaderId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LoaderId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for LoaderId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&LoaderId> for LoaderId {
    fn from(id: &LoaderId) -> Self {
        id.clone()
    }
}

/// A trait for types that can asynchronously fetch and decode one kind of resource.
///
/// Loaders are long-lived: the registry constructs one instance per
/// [`LoaderId`] and reuses it for every request, so a loader may keep its own
/// internal state (decoders, connection pools) across calls.
///
/// Returning a `Result` means every call reports exactly one outcome, exactly
/// once. Fine-grained progress can be reported through the [`ProgressSink`] any
/// number of times before the call returns.
#[async_trait]
pub trait ResourceLoader: Send + Sync + 'static {
    /// The decoded resource produced by this loader.
    type Output: Resource;

    /// Fetches and decodes the resource at `path`.
    ///
    /// # Errors
    /// Returns a [`LoadError`] if the resource cannot be fetched or decoded.
    /// The error is reported through the caller's error callback and is never
    /// propagated as a failed load.
    async fn load(&self, path: &ResourceKey, progress: &ProgressSink)
        -> Result<Self::Output, LoadError>;
}
