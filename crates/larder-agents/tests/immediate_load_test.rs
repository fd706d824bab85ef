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

mod common;

use anyhow::Result;
use common::{agent_with_mesh_loader, calls, recorder, Mesh, MESH};
use larder_core::{
    error::{LoadError, ResourceError},
    loader::{LoadProgress, LoaderId},
    resource::ResourceHandle,
};
use std::sync::Arc;

#[tokio::test]
async fn test_load_decodes_and_caches() -> Result<()> {
    let (agent, loader_calls) = agent_with_mesh_loader();

    let handle = agent.load(MESH, "a.obj", None, None).await?.expect("a.obj loads");

    assert_eq!(
        handle.downcast_ref::<Mesh>(),
        Some(&Mesh {
            source: "a.obj".into()
        })
    );
    assert!(agent.get_ready("a.obj").unwrap().ptr_eq(&handle));
    assert_eq!(calls(&loader_calls), 1);
    Ok(())
}

#[tokio::test]
async fn test_cached_path_is_not_fetched_again() -> Result<()> {
    let (agent, loader_calls) = agent_with_mesh_loader();

    let first = agent.load(MESH, "a.obj", None, None).await?.unwrap();
    let second = agent.load(MESH, "a.obj", None, None).await?.unwrap();

    assert!(first.ptr_eq(&second));
    assert_eq!(calls(&loader_calls), 1);
    assert_eq!(agent.metrics().cache_hits, 1);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_loads_share_one_fetch() -> Result<()> {
    let (agent, loader_calls) = agent_with_mesh_loader();

    let (first, second) = tokio::join!(
        agent.load(MESH, "slow.obj", None, None),
        agent.load(MESH, "slow.obj", None, None),
    );

    let (first, second) = (first?.unwrap(), second?.unwrap());
    assert!(first.ptr_eq(&second));
    assert_eq!(calls(&loader_calls), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_loads_across_tasks() -> Result<()> {
    let (agent, loader_calls) = agent_with_mesh_loader();

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let agent = agent.clone();
            tokio::spawn(async move { agent.load(MESH, "slow.obj", None, None).await })
        })
        .collect();

    for task in tasks {
        assert!(task.await??.is_some());
    }
    assert_eq!(calls(&loader_calls), 1);
    Ok(())
}

#[tokio::test]
async fn test_failure_is_reported_and_evicted() -> Result<()> {
    let (agent, loader_calls) = agent_with_mesh_loader();
    let errors = recorder::<LoadError>();
    let sink = errors.clone();

    let outcome = agent
        .load(
            MESH,
            "missing.obj",
            None,
            Some(Arc::new(move |err: &LoadError| {
                sink.lock().unwrap().push(err.clone())
            })),
        )
        .await?;

    assert!(outcome.is_none());
    assert!(agent.get("missing.obj").is_none());
    assert_eq!(
        *errors.lock().unwrap(),
        vec![LoadError::not_found("missing.obj")]
    );

    // Nothing was cached, so the next attempt starts from scratch.
    assert!(agent.load(MESH, "missing.obj", None, None).await?.is_none());
    assert_eq!(calls(&loader_calls), 2);
    assert_eq!(agent.metrics().loads_failed, 2);
    Ok(())
}

#[tokio::test]
async fn test_concurrent_failing_loads_each_report_the_error() -> Result<()> {
    let (agent, loader_calls) = agent_with_mesh_loader();
    let (first_errors, second_errors) = (recorder::<LoadError>(), recorder::<LoadError>());
    let (first_sink, second_sink) = (first_errors.clone(), second_errors.clone());

    let (first, second) = tokio::join!(
        agent.load(
            MESH,
            "missing-slow.obj",
            None,
            Some(Arc::new(move |err: &LoadError| {
                first_sink.lock().unwrap().push(err.clone())
            })),
        ),
        agent.load(
            MESH,
            "missing-slow.obj",
            None,
            Some(Arc::new(move |err: &LoadError| {
                second_sink.lock().unwrap().push(err.clone())
            })),
        ),
    );

    assert!(first?.is_none());
    assert!(second?.is_none());
    let expected = vec![LoadError::not_found("missing-slow.obj")];
    assert_eq!(*first_errors.lock().unwrap(), expected);
    assert_eq!(*second_errors.lock().unwrap(), expected);
    assert_eq!(calls(&loader_calls), 1);
    assert_eq!(agent.metrics().loads_failed, 1);
    assert!(agent.get("missing-slow.obj").is_none());
    Ok(())
}

#[tokio::test]
async fn test_joining_load_receives_no_progress() -> Result<()> {
    let (agent, _) = agent_with_mesh_loader();
    let (owner_events, joiner_events) = (recorder::<LoadProgress>(), recorder::<LoadProgress>());
    let (owner_sink, joiner_sink) = (owner_events.clone(), joiner_events.clone());

    let (owner, joiner) = tokio::join!(
        agent.load(
            MESH,
            "slow.obj",
            Some(Arc::new(move |event: LoadProgress| {
                owner_sink.lock().unwrap().push(event)
            })),
            None,
        ),
        agent.load(
            MESH,
            "slow.obj",
            Some(Arc::new(move |event: LoadProgress| {
                joiner_sink.lock().unwrap().push(event)
            })),
            None,
        ),
    );

    assert!(owner?.is_some());
    assert!(joiner?.is_some());
    assert_eq!(owner_events.lock().unwrap().len(), 2);
    assert!(joiner_events.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_progress_events_are_forwarded() -> Result<()> {
    let (agent, _) = agent_with_mesh_loader();
    let events = recorder::<LoadProgress>();
    let sink = events.clone();

    agent
        .load(
            MESH,
            "a.obj",
            Some(Arc::new(move |event: LoadProgress| {
                sink.lock().unwrap().push(event)
            })),
            None,
        )
        .await?;

    let ratios: Vec<_> = events.lock().unwrap().iter().map(|e| e.ratio()).collect();
    assert_eq!(ratios, vec![Some(0.0), Some(1.0)]);
    Ok(())
}

#[tokio::test]
async fn test_unknown_loader_is_an_error() {
    let (agent, _) = agent_with_mesh_loader();

    let err = agent.load("gltf", "scene.gltf", None, None).await.unwrap_err();

    assert_eq!(err, ResourceError::UnknownLoader(LoaderId::new("gltf")));
    assert!(agent.get("scene.gltf").is_none());
}

#[tokio::test]
async fn test_manually_added_value_is_returned() -> Result<()> {
    let (agent, loader_calls) = agent_with_mesh_loader();
    let manual = ResourceHandle::new(Mesh {
        source: "hand-made".into(),
    });
    agent.add("a.obj", manual.clone());

    // The cache is consulted before the loader id is even looked at.
    let handle = agent.load("gltf", "a.obj", None, None).await?.unwrap();

    assert!(handle.ptr_eq(&manual));
    assert_eq!(calls(&loader_calls), 0);
    Ok(())
}

#[test]
fn test_manual_cache_operations() {
    let (agent, _) = agent_with_mesh_loader();
    agent.add("config.toml", ResourceHandle::new(String::from("debug = true")));
    agent.add("answer", ResourceHandle::new(42u32));

    assert_eq!(agent.get_as::<u32>("answer").as_deref(), Some(&42));
    assert!(agent.get_as::<u32>("config.toml").is_none());
    assert_eq!(agent.remove(["answer", "never-added"]), 1);
    assert!(agent.get("answer").is_none());
    assert!(agent.get("config.toml").is_some());
}

#[test]
fn test_loader_instances_are_memoized_until_removed() {
    let (agent, _) = agent_with_mesh_loader();

    let first = agent.get_loader(MESH).unwrap();
    let again = agent.get_loader(MESH).unwrap();
    assert!(Arc::ptr_eq(&first, &again));

    assert!(agent.remove_loader(MESH));
    let fresh = agent.get_loader(MESH).unwrap();
    assert!(!Arc::ptr_eq(&first, &fresh));
    assert_eq!(agent.metrics().loaders_created, 2);

    assert!(fresh.as_any().downcast_ref::<common::MeshLoader>().is_some());
}
