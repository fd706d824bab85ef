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

//! Callback types and the per-call batch configuration.

use crate::{error::LoadError, resource::ResourceHandle};
use std::{fmt, sync::Arc};

pub use crate::loader::OnLoadProgress;

/// Receives the aggregate progress ratio (`completed / total`) of a batch.
pub type OnProgress = Arc<dyn Fn(f32) + Send + Sync>;

/// Receives every loader-reported failure.
pub type OnError = Arc<dyn Fn(&LoadError) + Send + Sync>;

/// Receives the resolved value of a single preloaded path.
pub type OnLoad = Box<dyn FnOnce(ResourceHandle) + Send>;

/// Configuration for a single `load_pending` call.
///
/// Any callback left unset falls back to the agent-wide [`CallbackDefaults`].
#[derive(Clone, Default)]
pub struct BatchConfig {
    /// Aggregate progress callback for this batch.
    pub on_progress: Option<OnProgress>,
    /// Error callback for this batch.
    pub on_error: Option<OnError>,
}

impl BatchConfig {
    /// A config that uses the agent defaults for everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the aggregate progress callback.
    pub fn with_on_progress(mut self, on_progress: impl Fn(f32) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(on_progress));
        self
    }

    /// Sets the error callback.
    pub fn with_on_error(
        mut self,
        on_error: impl Fn(&LoadError) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Arc::new(on_error));
        self
    }
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("on_progress", &self.on_progress.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Agent-wide fallback callbacks. Last write wins; `None` disables.
#[derive(Clone, Default)]
pub struct CallbackDefaults {
    /// Default aggregate progress callback.
    pub on_progress: Option<OnProgress>,
    /// Default error callback.
    pub on_error: Option<OnError>,
}

impl CallbackDefaults {
    /// Fills the unset callbacks of `config` from these defaults.
    pub fn resolve(&self, config: BatchConfig) -> BatchConfig {
        BatchConfig {
            on_progress: config.on_progress.or_else(|| self.on_progress.clone()),
            on_error: config.on_error.or_else(|| self.on_error.clone()),
        }
    }
}

impl fmt::Debug for CallbackDefaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackDefaults")
            .field("on_progress", &self.on_progress.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_explicit_callbacks_win_over_defaults() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let defaults = CallbackDefaults {
            on_progress: Some(Arc::new(|_: f32| panic!("default should be overridden"))),
            on_error: None,
        };

        let resolved = defaults.resolve(BatchConfig::new().with_on_progress(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        (resolved.on_progress.unwrap())(1.0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(resolved.on_error.is_none());
    }

    #[test]
    fn test_defaults_fill_missing_callbacks() {
        let defaults = CallbackDefaults {
            on_progress: None,
            on_error: Some(Arc::new(|_: &LoadError| {})),
        };

        let resolved = defaults.resolve(BatchConfig::default());
        assert!(resolved.on_progress.is_none());
        assert!(resolved.on_error.is_some());
    }
}
