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

use super::Resource;
use std::{any::Any, fmt, sync::Arc};

/// A thread-safe, reference-counted handle to a resolved resource.
///
/// The cache is loader-agnostic, so the concrete type is erased here and
/// recovered with [`ResourceHandle::downcast`]. Cloning a handle only bumps the
/// reference count.
#[derive(Clone)]
pub struct ResourceHandle(Arc<dyn Any + Send + Sync>);

impl ResourceHandle {
    /// Creates a new `ResourceHandle` that takes ownership of the value.
    pub fn new<T: Resource>(resource: T) -> Self {
        Self(Arc::new(resource))
    }

    /// Wraps an already shared value without copying it.
    pub fn from_arc<T: Resource>(resource: Arc<T>) -> Self {
        Self(resource)
    }

    /// Returns a typed, shared pointer to the value if it is a `T`.
    pub fn downcast<T: Resource>(&self) -> Option<Arc<T>> {
        self.0.clone().downcast::<T>().ok()
    }

    /// Borrows the value as a `T`, if it is one.
    pub fn downcast_ref<T: Resource>(&self) -> Option<&T> {
        (*self.0).downcast_ref::<T>()
    }

    /// Returns `true` if the stored value is a `T`.
    pub fn is<T: Resource>(&self) -> bool {
        (*self.0).is::<T>()
    }

    /// Returns `true` if both handles point to the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResourceHandle")
            .field(&Arc::as_ptr(&self.0))
            .finish()
    }
}
