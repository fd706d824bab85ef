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

//! Test loaders shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use larder_agents::ResourceAgent;
use larder_core::{
    error::LoadError,
    loader::{ProgressSink, ResourceLoader},
    resource::ResourceKey,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

pub const MESH: &str = "mesh";

/// A decoded mesh; only remembers where it came from.
#[derive(Debug, PartialEq)]
pub struct Mesh {
    pub source: String,
}

/// Fails for paths starting with `missing`. Paths containing `slow` take
/// longer to settle than the others.
pub struct MeshLoader {
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ResourceLoader for MeshLoader {
    type Output = Mesh;

    async fn load(&self, path: &ResourceKey, progress: &ProgressSink) -> Result<Mesh, LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        progress.report(0, Some(100));

        let suspensions = if path.as_str().contains("slow") { 16 } else { 1 };
        for _ in 0..suspensions {
            tokio::task::yield_now().await;
        }

        progress.report(100, Some(100));
        if path.as_str().starts_with("missing") {
            return Err(LoadError::not_found(path));
        }
        Ok(Mesh {
            source: path.to_string(),
        })
    }
}

/// An agent with a [`MeshLoader`] registered as [`MESH`], plus the number of
/// times the loader has been invoked.
pub fn agent_with_mesh_loader() -> (ResourceAgent, Arc<AtomicUsize>) {
    larder_telemetry::init_logging_with_filter("debug");

    let agent = ResourceAgent::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    agent.register_loader_with(MESH, move || MeshLoader {
        calls: counter.clone(),
    });
    (agent, calls)
}

/// A shared vector that callbacks can push into.
pub fn recorder<T>() -> Arc<Mutex<Vec<T>>> {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}
