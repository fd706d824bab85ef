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

//! Fan-out/fan-in bookkeeping for a single batch drain.

use futures::{future::BoxFuture, FutureExt};
use larder_core::callbacks::{OnError, OnLoad, OnProgress};
use larder_data::InFlight;
use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
    sync::Arc,
};

/// Per-drain counters shared by every operation of one batch.
///
/// `total` only grows while the queue is being drained, before any operation
/// is polled, so every ratio reported is `completed / final total`.
pub struct BatchContext {
    total: AtomicUsize,
    completed: AtomicUsize,
    on_progress: Option<OnProgress>,
}

impl BatchContext {
    /// Creates a context reporting to `on_progress`.
    pub fn new(on_progress: Option<OnProgress>) -> Self {
        Self {
            total: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            on_progress,
        }
    }

    /// Counts one more load operation and returns the new total.
    pub fn register_operation(&self) -> usize {
        self.total.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Marks one operation as settled, successful or not, reports the new
    /// ratio to the progress callback and returns it.
    pub fn complete_operation(&self) -> f32 {
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        let total = self.total.load(Ordering::SeqCst);
        debug_assert!(completed <= total, "more completions than operations");

        let ratio = completed as f32 / total as f32;
        log::trace!("Batch progress {}/{} ({:.2})", completed, total, ratio);
        if let Some(on_progress) = &self.on_progress {
            on_progress(ratio);
        }
        ratio
    }

    /// Operations counted so far.
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Operations settled so far.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for BatchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchContext")
            .field("total", &self.total())
            .field("completed", &self.completed())
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// A load owned by this batch: awaits it, reports a failure to `on_error`,
/// ticks the progress counter, then hands a successful value to `on_load`.
pub(crate) fn operation(
    context: Arc<BatchContext>,
    in_flight: InFlight,
    on_load: Option<OnLoad>,
    on_error: Option<OnError>,
) -> BoxFuture<'static, ()> {
    async move {
        match in_flight.await {
            Ok(handle) => {
                context.complete_operation();
                if let Some(on_load) = on_load {
                    on_load(handle);
                }
            }
            Err(err) => {
                if let Some(on_error) = &on_error {
                    on_error(&err);
                }
                context.complete_operation();
            }
        }
    }
    .boxed()
}

/// A path that was already loading when the batch reached it.
///
/// Awaiting it keeps that load running even if its owner went away. It does
/// not count toward the batch progress. `on_error` is `None` when the load
/// belongs to this batch, whose own operation reports the failure.
pub(crate) fn follow(
    in_flight: InFlight,
    on_load: Option<OnLoad>,
    on_error: Option<OnError>,
) -> BoxFuture<'static, ()> {
    async move {
        match in_flight.await {
            Ok(handle) => {
                if let Some(on_load) = on_load {
                    on_load(handle);
                }
            }
            Err(err) => {
                if let Some(on_error) = &on_error {
                    on_error(&err);
                }
            }
        }
    }
    .boxed()
}
