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

use std::{io::ErrorKind, sync::Arc};

use anyhow::{bail, Result};
use async_trait::async_trait;
use larder_agents::ResourceAgent;
use larder_core::{BatchConfig, LoadError, ProgressSink, ResourceKey, ResourceLoader};
use larder_data::PreloadItem;

const TEXT: &str = "text";

/// Reads a UTF-8 file from disk.
#[derive(Default)]
struct TextLoader;

#[async_trait]
impl ResourceLoader for TextLoader {
    type Output = String;

    async fn load(&self, path: &ResourceKey, progress: &ProgressSink) -> Result<String, LoadError> {
        let bytes = tokio::fs::read(path.as_str())
            .await
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => LoadError::not_found(path),
                _ => LoadError::fetch(path, err),
            })?;

        let size = bytes.len() as u64;
        progress.report(size, Some(size));
        String::from_utf8(bytes).map_err(|err| LoadError::decode(path, err))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    larder_telemetry::init_logging();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        bail!("usage: sandbox <file>...");
    }

    let agent = ResourceAgent::new();
    agent.register_loader::<TextLoader>(TEXT);
    agent.set_on_error_default(Some(Arc::new(|err: &LoadError| {
        log::error!("{}", err);
    })));

    let items = paths.iter().map(|path| {
        let name = path.clone();
        PreloadItem::with_on_load(path, move |handle| {
            if let Some(text) = handle.downcast_ref::<String>() {
                log::info!("{}: {} line(s)", name, text.lines().count());
            }
        })
    });
    agent.preload(TEXT, items)?;

    agent
        .load_pending(
            BatchConfig::new().with_on_progress(|ratio| log::info!("Progress: {:.0}%", ratio * 100.0)),
        )
        .await?;

    let loaded = paths.iter().filter(|path| agent.get_ready(path).is_some()).count();
    println!("Loaded {}/{} file(s)", loaded, paths.len());
    log::info!("Metrics: {}", agent.metrics().to_json()?);
    Ok(())
}
