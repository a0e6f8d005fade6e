// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Creates, deletes and reports on instances by driving the resource managers.

use crate::config::Config;
use crate::error::Result;
use crate::kubernetes::manager::{DeploymentManager, NamespaceManager, ResourceManager, ServiceManager};
use crate::kubernetes::nodes::{node_address, NodeService};
use crate::kubernetes::resources::{template_labels, RequestHelper, ResourceBuilder};
use crate::kubernetes::status::{instance_state, ServiceSnapshot};
use crate::types::{InstanceDeletion, InstanceNetwork, InstanceSpec, K8sInstance, K8sInstanceState};
use k8s_openapi::api::core::v1::{Endpoints, Namespace, Service};
use kube::Client;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Entry point for everything the REST layer asks of the cluster
#[derive(Clone)]
pub struct K8sInstanceService {
    config: Config,
    namespaces: NamespaceManager,
    deployments: DeploymentManager,
    services: ServiceManager,
    endpoints: ResourceManager<Endpoints>,
    nodes: NodeService,
    helper: Option<Arc<dyn RequestHelper>>,
}

impl K8sInstanceService {
    pub fn new(client: Client, config: Config) -> Self {
        Self {
            config,
            namespaces: NamespaceManager::new(client.clone()),
            deployments: DeploymentManager::new(client.clone()),
            services: ServiceManager::new(client.clone()),
            endpoints: ResourceManager::new(client.clone()),
            nodes: NodeService::new(client),
            helper: None,
        }
    }

    pub fn with_helper(mut self, helper: Arc<dyn RequestHelper>) -> Self {
        self.helper = Some(helper);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn namespace(&self) -> &str {
        &self.config.default_namespace
    }

    fn builder(&self) -> ResourceBuilder<'_> {
        let builder = ResourceBuilder::new(&self.config.owner_label, self.namespace());
        match &self.helper {
            Some(helper) => builder.with_helper(helper.as_ref()),
            None => builder,
        }
    }

    /// Make sure the instance namespace exists
    pub async fn init(&self) -> Result<Namespace> {
        let namespace = self.builder().build_namespace();
        self.namespaces.ensure(&namespace, self.namespace()).await
    }

    /// Create the namespace, Deployment and Service of an instance, in that order.
    /// A failure leaves earlier resources in place; calling again resumes.
    #[instrument(skip(self, spec), fields(instance = %spec.name))]
    pub async fn create(&self, spec: &InstanceSpec) -> Result<K8sInstance> {
        let resources = self.builder().build(spec);
        let namespace = self.namespace();

        self.namespaces.ensure(&resources.namespace, namespace).await?;

        info!("Creating Deployment in Kubernetes");
        let deployment = self.deployments.ensure(&resources.deployment, namespace).await?;

        let selector = resources.service.spec.as_ref().and_then(|s| s.selector.as_ref());
        let bound = match (template_labels(&deployment), selector) {
            (Some(labels), Some(selector)) => selector.iter().all(|(k, v)| labels.get(k) == Some(v)),
            _ => false,
        };
        if !bound {
            warn!("Existing deployment pod labels do not match the service selector");
        }

        info!("Creating Service in Kubernetes");
        let service = self.services.ensure(&resources.service, namespace).await?;

        Ok(K8sInstance { deployment, service })
    }

    /// Delete an instance's Service and Deployment; the namespace is shared and kept
    pub async fn delete(&self, name: &str) -> bool {
        self.delete_resources(name).await.is_complete()
    }

    /// Delete both resources, attempting the Deployment even when the Service fails
    #[instrument(skip(self))]
    pub async fn delete_resources(&self, name: &str) -> InstanceDeletion {
        let service_deleted = self.services.delete(name, self.namespace()).await;
        let deployment_deleted = self.deployments.delete(name, self.namespace()).await;

        let deletion = InstanceDeletion {
            service_deleted,
            deployment_deleted,
        };
        if !deletion.is_complete() {
            warn!(
                service_deleted,
                deployment_deleted,
                "Instance {} was only partially deleted",
                name
            );
        }
        deletion
    }

    /// Derive the current state from live cluster data
    #[instrument(skip(self))]
    pub async fn get_state(&self, name: &str) -> Result<K8sInstanceState> {
        let Some(deployment) = self.deployments.get(name, self.namespace()).await? else {
            debug!("Deployment {} does not exist", name);
            return Ok(K8sInstanceState::unknown());
        };

        instance_state(&deployment, || self.service_snapshot(name)).await
    }

    async fn service_snapshot(&self, name: &str) -> Result<Option<ServiceSnapshot>> {
        let Some(service) = self.services.get(name, self.namespace()).await? else {
            return Ok(None);
        };
        let endpoints = self.endpoints.get(name, self.namespace()).await?;
        Ok(Some(ServiceSnapshot { service, endpoints }))
    }

    /// Host and node ports a user connects to; `None` without a Service
    #[instrument(skip(self))]
    pub async fn network(&self, name: &str) -> Result<Option<InstanceNetwork>> {
        let Some(service) = self.services.get(name, self.namespace()).await? else {
            return Ok(None);
        };

        let host = self.nodes.master().await?.as_ref().and_then(node_address);
        Ok(Some(InstanceNetwork {
            host,
            ports: node_ports(&service),
        }))
    }
}

fn node_ports(service: &Service) -> std::collections::BTreeMap<String, i32> {
    service
        .spec
        .as_ref()
        .and_then(|s| s.ports.as_ref())
        .into_iter()
        .flatten()
        .filter_map(|p| {
            let node_port = p.node_port?;
            Some((p.name.clone().unwrap_or_else(|| p.port.to_string()), node_port))
        })
        .collect()
}
