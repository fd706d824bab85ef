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

//! `env_logger` setup for binaries and tests.

use env_logger::{Builder, Env};

/// Initialises logging at `info`, overridable through `RUST_LOG`.
///
/// Returns `false` if a logger was already installed.
pub fn init_logging() -> bool {
    init_logging_with_filter("info")
}

/// Initialises logging with `default_filter` unless `RUST_LOG` is set.
///
/// Safe to call more than once; later calls are ignored and return `false`.
pub fn init_logging_with_filter(default_filter: &str) -> bool {
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}
