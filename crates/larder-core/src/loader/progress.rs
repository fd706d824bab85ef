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

use std::{fmt, sync::Arc};

/// A fine-grained progress event reported by a loader while it works.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    /// Units (usually bytes) processed so far.
    pub loaded: u64,
    /// Total units expected, if known.
    pub total: Option<u64>,
}

impl LoadProgress {
    /// Returns `loaded / total` in `[0, 1]`, or `None` if the total is unknown.
    pub fn ratio(&self) -> Option<f32> {
        match self.total {
            Some(0) => Some(1.0),
            Some(total) => Some((self.loaded.min(total) as f64 / total as f64) as f32),
            None => None,
        }
    }
}

/// Callback receiving the raw progress events of a single load.
pub type OnLoadProgress = Arc<dyn Fn(LoadProgress) + Send + Sync>;

/// Where a loader reports its fine-grained progress.
///
/// The sink is a pass-through hook: the events are forwarded to the caller of
/// an immediate load and are not aggregated anywhere.
#[derive(Clone, Default)]
pub struct ProgressSink {
    callback: Option<OnLoadProgress>,
}

impl ProgressSink {
    /// A sink that discards every event.
    pub fn none() -> Self {
        Self { callback: None }
    }

    /// A sink forwarding every event to `callback`.
    pub fn new(callback: OnLoadProgress) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    /// Reports that `loaded` out of `total` units have been processed.
    pub fn report(&self, loaded: u64, total: Option<u64>) {
        if let Some(callback) = &self.callback {
            callback(LoadProgress { loaded, total });
        }
    }

    /// Returns `true` if somebody is listening.
    pub fn is_active(&self) -> bool {
        self.callback.is_some()
    }
}

impl From<Option<OnLoadProgress>> for ProgressSink {
    fn from(callback: Option<OnLoadProgress>) -> Self {
        Self { callback }
    }
}

impl fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressSink")
            .field("active", &self.is_active())
            .finish()
    }
}
