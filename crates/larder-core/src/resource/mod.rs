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

//! Primitive types describing cacheable resources.
//!
//! - The [`Resource`] trait: a marker for every value the cache can hold.
//! - [`ResourceKey`]: the path/URL that identifies a cached entry.
//! - [`ResourceHandle`]: a shared, type-erased pointer to a resolved value.

mod handle;
mod key;

pub use handle::*;
pub use key::*;

/// A marker trait for types that can be stored in the resource cache.
///
/// The supertraits make resources shareable between the tasks that drive
/// loads and the callers reading the cache. Every `Send + Sync + 'static`
/// type is a resource, so values not produced by a loader can be inserted
/// manually as well.
///
/// # Examples
///
/// ```
/// use larder_core::resource::{Resource, ResourceHandle};
///
/// struct Texture {
///     width: u32,
/// }
///
/// fn assert_resource<R: Resource>() {}
/// assert_resource::<Texture>();
///
/// let handle = ResourceHandle::new(Texture { width: 64 });
/// assert_eq!(handle.downcast_ref::<Texture>().map(|t| t.width), Some(64));
/// ```
pub trait Resource: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Resource for T {}
