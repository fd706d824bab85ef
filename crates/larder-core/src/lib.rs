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

//! # Larder Core
//!
//! Foundational crate containing the resource types, the loader contract and
//! the error hierarchy shared by every other Larder crate.
//!
//! It has no knowledge of how resources are cached or scheduled; that lives in
//! `larder-data` and `larder-agents`.

#![warn(missing_docs)]

pub mod callbacks;
pub mod error;
pub mod loader;
pub mod resource;

pub use callbacks::{BatchConfig, CallbackDefaults};
pub use error::{LoadError, ResourceError};
pub use loader::{LoadProgress, LoaderId, ProgressSink, ResourceLoader};
pub use resource::{Resource, ResourceHandle, ResourceKey};
