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

//! Lock-free counters and a sample histogram describing loader activity.

use serde::Serialize;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex, PoisonError,
};

/// A monotonically increasing counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    /// Increment the counter by 1 and return the new value.
    pub fn increment(&self) -> u64 {
        self.increment_by(1)
    }

    /// Increment the counter by `amount` and return the new value.
    pub fn increment_by(&self, amount: u64) -> u64 {
        self.0.fetch_add(amount, Ordering::Relaxed) + amount
    }

    /// Current value.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Records raw samples of a measured quantity.
#[derive(Debug, Default)]
pub struct Histogram {
    samples: Mutex<Vec<f64>>,
}

impl Histogram {
    /// Creates an empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sample.
    pub fn observe(&self, value: f64) {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(value);
    }

    /// Arithmetic mean of the samples, or `None` if there are none.
    pub fn mean(&self) -> Option<f64> {
        let samples = self.samples.lock().unwrap_or_else(PoisonError::into_inner);
        if samples.is_empty() {
            None
        } else {
            Some(samples.iter().sum::<f64>() / samples.len() as f64)
        }
    }
}

/// The metric handles owned by a resource agent.
#[derive(Debug)]
pub struct LoaderMetrics {
    /// Loader invocations started.
    pub loads_started: Counter,
    /// Loader invocations that produced a value.
    pub loads_succeeded: Counter,
    /// Loader invocations that reported an error.
    pub loads_failed: Counter,
    /// Requests answered from the cache without invoking a loader.
    pub cache_hits: Counter,
    /// Loader instances constructed by the registry.
    pub loaders_created: Counter,
    /// Completed batch drains.
    pub batches_completed: Counter,
    /// Time spent inside loaders, in milliseconds.
    pub load_time_ms: Histogram,
}

impl LoaderMetrics {
    /// Creates a zeroed metric set.
    pub fn new() -> Self {
        Self {
            loads_started: Counter::default(),
            loads_succeeded: Counter::default(),
            loads_failed: Counter::default(),
            cache_hits: Counter::default(),
            loaders_created: Counter::default(),
            batches_completed: Counter::default(),
            load_time_ms: Histogram::new(),
        }
    }

    /// Copies the current values into a plain, serializable struct.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            loads_started: self.loads_started.get(),
            loads_succeeded: self.loads_succeeded.get(),
            loads_failed: self.loads_failed.get(),
            cache_hits: self.cache_hits.get(),
            loaders_created: self.loaders_created.get(),
            batches_completed: self.batches_completed.get(),
            mean_load_time_ms: self.load_time_ms.mean(),
        }
    }
}

impl Default for LoaderMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time copy of [`LoaderMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MetricsSnapshot {
    /// Loader invocations started.
    pub loads_started: u64,
    /// Loader invocations that produced a value.
    pub loads_succeeded: u64,
    /// Loader invocations that reported an error.
    pub loads_failed: u64,
    /// Requests answered from the cache.
    pub cache_hits: u64,
    /// Loader instances constructed.
    pub loaders_created: u64,
    /// Completed batch drains.
    pub batches_completed: u64,
    /// Mean loader time in milliseconds.
    pub mean_load_time_ms: Option<f64>,
}

impl MetricsSnapshot {
    /// Loads that are still running.
    pub fn loads_in_flight(&self) -> u64 {
        self.loads_started
            .saturating_sub(self.loads_succeeded + self.loads_failed)
    }

    /// Renders the snapshot as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
