// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Follows an instance until the caller stops listening.
//!
//! The state itself stays pull based: every change to the instance's
//! Deployment or to its Service endpoints triggers a fresh `get_state`, and
//! only transitions are reported.

use crate::error::Result;
use crate::instances::service::K8sInstanceService;
use crate::types::K8sInstanceState;
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt, TryStreamExt};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Endpoints;
use kube::{Api, Client};
use kube_runtime::watcher::{self, Config as WatcherConfig};
use kube_runtime::WatchStreamExt;
use std::ops::ControlFlow;
use tracing::{debug, info, instrument};

type Changes = BoxStream<'static, std::result::Result<(), watcher::Error>>;

/// Re-derive the state of `name` whenever its Deployment or Endpoints change
/// and hand each new state to `on_state`. Returns when `on_state` breaks or
/// the watch ends.
#[instrument(skip(client, instances, on_state))]
pub async fn watch_instance_state<F>(
    client: Client,
    instances: &K8sInstanceService,
    name: &str,
    on_state: F,
) -> Result<()>
where
    F: FnMut(&K8sInstanceState) -> ControlFlow<()>,
{
    let changes = instance_changes(client, &instances.config().default_namespace, name);
    follow_instance_state(instances, name, changes, on_state).await
}

/// One event per touched Deployment or Endpoints object named `name`.
/// Endpoints usually settle after the Deployment turns available.
fn instance_changes(client: Client, namespace: &str, name: &str) -> Changes {
    let config = WatcherConfig::default().fields(&format!("metadata.name={}", name));
    let deployments: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    let endpoints: Api<Endpoints> = Api::namespaced(client, namespace);

    let deployment_changes = watcher::watcher(deployments, config.clone())
        .default_backoff()
        .touched_objects()
        .map_ok(|_| ());
    let endpoint_changes = watcher::watcher(endpoints, config)
        .default_backoff()
        .touched_objects()
        .map_ok(|_| ());

    stream::select(deployment_changes, endpoint_changes).boxed()
}

async fn follow_instance_state<S, F>(
    instances: &K8sInstanceService,
    name: &str,
    mut changes: S,
    mut on_state: F,
) -> Result<()>
where
    S: Stream<Item = std::result::Result<(), watcher::Error>> + Unpin,
    F: FnMut(&K8sInstanceState) -> ControlFlow<()>,
{
    let mut last = instances.get_state(name).await?;
    info!("Instance {} is {}", name, last);
    if on_state(&last).is_break() {
        return Ok(());
    }

    while changes.try_next().await?.is_some() {
        let state = instances.get_state(name).await?;
        if state == last {
            debug!("Instance {} unchanged", name);
            continue;
        }

        info!("Instance {} is now {}", name, state);
        if on_state(&state).is_break() {
            break;
        }
        last = state;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::test_utils::MockService;
    use crate::types::K8sInstanceStatus;

    const DEPLOYMENT: &str = "/apis/apps/v1/namespaces/panosc/deployments/demo";
    const SERVICE: &str = "/api/v1/namespaces/panosc/services/demo";
    const ENDPOINTS: &str = "/api/v1/namespaces/panosc/endpoints/demo";

    fn available_deployment_json() -> String {
        serde_json::json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": { "name": "demo", "namespace": "panosc" },
            "spec": {
                "selector": { "matchLabels": { "app": "demo" } },
                "template": {
                    "spec": {
                        "containers": [{
                            "name": "demo",
                            "ports": [{ "name": "rdp", "containerPort": 3389 }]
                        }]
                    }
                }
            },
            "status": {
                "conditions": [{ "type": "Available", "status": "True", "message": "ready" }]
            }
        })
        .to_string()
    }

    fn service_json() -> String {
        serde_json::json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": { "name": "demo", "namespace": "panosc" }
        })
        .to_string()
    }

    fn endpoints_json(ports: &[i32]) -> String {
        let subsets = if ports.is_empty() {
            serde_json::json!([])
        } else {
            let ports: Vec<_> = ports.iter().map(|port| serde_json::json!({ "port": port })).collect();
            serde_json::json!([{ "addresses": [{ "ip": "10.42.0.7" }], "ports": ports }])
        };
        serde_json::json!({
            "apiVersion": "v1",
            "kind": "Endpoints",
            "metadata": { "name": "demo", "namespace": "panosc" },
            "subsets": subsets
        })
        .to_string()
    }

    fn events(count: usize) -> impl Stream<Item = std::result::Result<(), watcher::Error>> + Unpin {
        stream::iter((0..count).map(|_| Ok(())))
    }

    fn make_instances(mock: &MockService) -> K8sInstanceService {
        K8sInstanceService::new(mock.clone().into_client(), Config::new("panosc", "visa").unwrap())
    }

    #[tokio::test]
    async fn test_reports_current_state_first() {
        let mock = MockService::new();
        let client = mock.clone().into_client();
        let instances = K8sInstanceService::new(client.clone(), Config::new("panosc", "visa").unwrap());

        let mut seen = Vec::new();
        watch_instance_state(client, &instances, "demo", |state| {
            seen.push(state.clone());
            ControlFlow::Break(())
        })
        .await
        .unwrap();

        assert_eq!(seen, vec![K8sInstanceState::unknown()]);
        assert_eq!(mock.count("GET", DEPLOYMENT), 1);
    }

    #[tokio::test]
    async fn test_endpoint_change_after_deployment_change_turns_active() {
        // Deployment event arrives while the endpoints are still empty; the
        // following endpoints event carries the routed port.
        let mock = MockService::new()
            .on_get(DEPLOYMENT, 200, &available_deployment_json())
            .on_get(SERVICE, 200, &service_json())
            .on_get(ENDPOINTS, 200, &endpoints_json(&[]))
            .on_get(ENDPOINTS, 200, &endpoints_json(&[]))
            .on_get(ENDPOINTS, 200, &endpoints_json(&[3389]));
        let instances = make_instances(&mock);

        let mut seen = Vec::new();
        follow_instance_state(&instances, "demo", events(2), |state| {
            seen.push(state.clone());
            if state.status == K8sInstanceStatus::Active {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .await
        .unwrap();

        assert_eq!(
            seen,
            vec![
                K8sInstanceState::error("Service has no or too many endpoints"),
                K8sInstanceState::active(),
            ]
        );
        assert_eq!(mock.count("GET", ENDPOINTS), 3);
    }

    #[tokio::test]
    async fn test_unchanged_state_is_not_reported_again() {
        let mock = MockService::new()
            .on_get(DEPLOYMENT, 200, &available_deployment_json())
            .on_get(SERVICE, 200, &service_json())
            .on_get(ENDPOINTS, 200, &endpoints_json(&[3389]));
        let instances = make_instances(&mock);

        let mut seen = Vec::new();
        follow_instance_state(&instances, "demo", events(3), |state| {
            seen.push(state.clone());
            ControlFlow::Continue(())
        })
        .await
        .unwrap();

        assert_eq!(seen, vec![K8sInstanceState::active()]);
        assert_eq!(mock.count("GET", DEPLOYMENT), 4);
    }
}
