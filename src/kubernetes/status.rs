// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Collapses Deployment conditions and Service endpoints into one instance state.
//!
//! Everything here works on snapshots fetched by the caller; the Service is
//! only fetched, through the future handed to [`instance_state`], once the
//! Deployment is available. Evaluation order:
//!
//! 1. The Deployment's most recent conditions decide the Deployment state.
//!    Anything but `Available` is final and the Service is not looked at.
//! 2. An available Deployment is only reported active once its Service has
//!    exactly one endpoint subset routing every container port.

use crate::error::Result;
use crate::kubernetes::resources::deployment_ports;
use crate::types::{K8sInstanceState, K8sInstanceStatus};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentCondition};
use k8s_openapi::api::core::v1::{Endpoints, Service};
use std::future::Future;
use tracing::warn;

const NO_SINGLE_ENDPOINT: &str = "Service has no or too many endpoints";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeploymentState {
    Unknown(Option<String>),
    Building(Option<String>),
    Active(Option<String>),
    Error(Option<String>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceState {
    Active,
    Error(String),
}

/// The live Service of an instance together with its endpoints
#[derive(Clone, Debug)]
pub struct ServiceSnapshot {
    pub service: Service,
    pub endpoints: Option<Endpoints>,
}

impl DeploymentState {
    pub fn is_active(&self) -> bool {
        matches!(self, DeploymentState::Active(_))
    }
}

/// Derive the Deployment state from its most recent conditions
pub fn deployment_state(deployment: &Deployment) -> DeploymentState {
    let conditions = deployment
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_deref())
        .unwrap_or_default();

    let Some(current) = current_condition(conditions) else {
        warn!(
            "Couldn't find a current condition for deployment {}",
            deployment.metadata.name.as_deref().unwrap_or_default()
        );
        return DeploymentState::Unknown(None);
    };

    let message = current.message.clone();
    match current.type_.to_lowercase().as_str() {
        "available" => DeploymentState::Active(message),
        "progressing" => DeploymentState::Building(message),
        "replicafailure" => DeploymentState::Error(message),
        _ => DeploymentState::Unknown(message),
    }
}

/// The condition with status "True" among those sharing the latest transition time
fn current_condition(conditions: &[DeploymentCondition]) -> Option<&DeploymentCondition> {
    let latest = conditions
        .iter()
        .map(|c| c.last_transition_time.as_ref().map(|t| t.0))
        .max()?;

    conditions
        .iter()
        .filter(|c| c.last_transition_time.as_ref().map(|t| t.0) == latest)
        .find(|c| c.status == "True")
}

/// Check that the Service routes every port the Deployment declares.
/// An absent Service has no endpoints at all.
pub fn service_state(deployment: &Deployment, service: Option<&ServiceSnapshot>) -> ServiceState {
    let subsets = service
        .and_then(|s| s.endpoints.as_ref())
        .and_then(|e| e.subsets.as_deref())
        .unwrap_or_default();

    let [subset] = subsets else {
        return ServiceState::Error(NO_SINGLE_ENDPOINT.to_string());
    };

    let endpoint_ports = subset.ports.as_deref().unwrap_or_default();
    for port in deployment_ports(deployment) {
        if !endpoint_ports.iter().any(|p| p.port == port.container_port) {
            let name = port
                .name
                .clone()
                .unwrap_or_else(|| port.container_port.to_string());
            return ServiceState::Error(format!("port {} has not been mapped to the service", name));
        }
    }

    ServiceState::Active
}

impl From<DeploymentState> for K8sInstanceState {
    fn from(state: DeploymentState) -> Self {
        match state {
            DeploymentState::Unknown(message) => K8sInstanceState::new(K8sInstanceStatus::Unknown, message),
            DeploymentState::Building(message) => K8sInstanceState::new(K8sInstanceStatus::Building, message),
            DeploymentState::Active(message) => K8sInstanceState::new(K8sInstanceStatus::Active, message),
            DeploymentState::Error(message) => K8sInstanceState::new(K8sInstanceStatus::Error, message),
        }
    }
}

/// Composite state of an instance whose Deployment is available
pub fn available_instance_state(service_state: ServiceState) -> K8sInstanceState {
    match service_state {
        ServiceState::Active => K8sInstanceState::active(),
        ServiceState::Error(message) => K8sInstanceState::error(message),
    }
}

/// Composite state of an instance. `service` is only called, and its future
/// only awaited, when the Deployment is available.
pub async fn instance_state<F, Fut>(deployment: &Deployment, service: F) -> Result<K8sInstanceState>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Option<ServiceSnapshot>>>,
{
    match deployment_state(deployment) {
        DeploymentState::Active(_) => {
            let snapshot = service().await?;
            Ok(available_instance_state(service_state(deployment, snapshot.as_ref())))
        }
        state => Ok(state.into()),
    }
}
