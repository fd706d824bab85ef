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

//! Acts as the agent for the resource subsystem.
//!
//! This module holds the tactical logic of resource management: deciding
//! whether a path needs a loader at all, sharing in-flight loads between
//! requesters, and aggregating the progress of a whole batch. The actual
//! fetching and decoding is delegated to the registered
//! [`ResourceLoader`](larder_core::loader::ResourceLoader)s.
//!
//! The entry point is [`ResourceAgent`].

pub mod agent;
pub mod batch;
pub mod registry;

pub use agent::ResourceAgent;
pub use batch::BatchContext;
pub use registry::{ErasedLoader, LoaderRegistry};
