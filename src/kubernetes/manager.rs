// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Idempotent get / ensure / delete over any resource kind an instance uses.
//!
//! `ensure` never patches an existing resource: whatever already carries the
//! name is returned as is. Concurrent creators of the same name all converge
//! on the one resource the API server accepted.

use crate::error::{ProvisionerError, Result};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Endpoints, Namespace, Node, Service};
use kube::{
    api::{DeleteParams, PostParams},
    Api, Client, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use std::marker::PhantomData;
use tracing::{debug, error, info, instrument};

/// A resource kind the managers know how to address.
pub trait ManagedResource:
    Resource<DynamicType = ()> + Clone + Debug + DeserializeOwned + Serialize + Send + Sync + 'static
{
    /// API handle for the kind. Cluster scoped kinds ignore `namespace`.
    fn api(client: Client, namespace: &str) -> Api<Self>;
}

impl ManagedResource for Namespace {
    fn api(client: Client, _namespace: &str) -> Api<Self> {
        Api::all(client)
    }
}

impl ManagedResource for Node {
    fn api(client: Client, _namespace: &str) -> Api<Self> {
        Api::all(client)
    }
}

impl ManagedResource for Deployment {
    fn api(client: Client, namespace: &str) -> Api<Self> {
        Api::namespaced(client, namespace)
    }
}

impl ManagedResource for Service {
    fn api(client: Client, namespace: &str) -> Api<Self> {
        Api::namespaced(client, namespace)
    }
}

impl ManagedResource for Endpoints {
    fn api(client: Client, namespace: &str) -> Api<Self> {
        Api::namespaced(client, namespace)
    }
}

pub type NamespaceManager = ResourceManager<Namespace>;
pub type DeploymentManager = ResourceManager<Deployment>;
pub type ServiceManager = ResourceManager<Service>;

pub struct ResourceManager<K> {
    client: Client,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Clone for ResourceManager<K> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: ManagedResource> ResourceManager<K> {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    fn api(&self, namespace: &str) -> Api<K> {
        K::api(self.client.clone(), namespace)
    }

    fn kind() -> String {
        K::kind(&()).into_owned()
    }

    /// Fetch a resource; `None` when it does not exist
    #[instrument(skip(self), fields(kind = %K::kind(&())))]
    pub async fn get(&self, name: &str, namespace: &str) -> Result<Option<K>> {
        Ok(self.api(namespace).get_opt(name).await?)
    }

    /// Return the resource named like `descriptor`, creating it when absent
    #[instrument(skip(self, descriptor), fields(kind = %K::kind(&()), name = %descriptor.name_any()))]
    pub async fn ensure(&self, descriptor: &K, namespace: &str) -> Result<K> {
        let name = descriptor.name_any();

        if let Some(existing) = self.get(&name, namespace).await? {
            debug!("{} {} already exists", Self::kind(), name);
            return Ok(existing);
        }

        info!("Creating {} {}", Self::kind(), name);
        match self.api(namespace).create(&PostParams::default(), descriptor).await {
            Ok(created) => {
                info!("{} {} created successfully", Self::kind(), name);
                Ok(created)
            }
            Err(kube::Error::Api(err)) if err.code == 409 && err.reason == "AlreadyExists" => {
                debug!("{} {} was created concurrently, fetching it", Self::kind(), name);
                self.get(&name, namespace)
                    .await?
                    .ok_or_else(|| ProvisionerError::ResourceConflict {
                        kind: Self::kind(),
                        name,
                    })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a resource. An absent resource counts as deleted.
    #[instrument(skip(self), fields(kind = %K::kind(&())))]
    pub async fn delete(&self, name: &str, namespace: &str) -> bool {
        match self.api(namespace).delete(name, &DeleteParams::default()).await {
            Ok(_) => {
                info!("{} {} deleted", Self::kind(), name);
                true
            }
            Err(kube::Error::Api(err)) if err.code == 404 => {
                debug!("{} {} does not exist, nothing to delete", Self::kind(), name);
                true
            }
            Err(e) => {
                error!("Failed to delete {} {}: {}", Self::kind(), name, e);
                false
            }
        }
    }

    /// List every resource of the kind in the namespace
    pub async fn list(&self, namespace: &str) -> Result<Vec<K>> {
        let list = self.api(namespace).list(&Default::default()).await?;
        Ok(list.items)
    }
}
