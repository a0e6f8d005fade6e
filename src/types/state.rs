// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Service;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle status reported for an instance
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum K8sInstanceStatus {
    Unknown,
    Building,
    Active,
    Error,
}

impl fmt::Display for K8sInstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            K8sInstanceStatus::Unknown => "UNKNOWN",
            K8sInstanceStatus::Building => "BUILDING",
            K8sInstanceStatus::Active => "ACTIVE",
            K8sInstanceStatus::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Composite state derived from live cluster data. Never stored.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct K8sInstanceState {
    pub status: K8sInstanceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl K8sInstanceState {
    pub fn new(status: K8sInstanceStatus, message: Option<String>) -> Self {
        Self { status, message }
    }

    pub fn unknown() -> Self {
        Self::new(K8sInstanceStatus::Unknown, None)
    }

    pub fn active() -> Self {
        Self::new(K8sInstanceStatus::Active, None)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(K8sInstanceStatus::Error, Some(message.into()))
    }
}

impl fmt::Display for K8sInstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.status, message),
            None => write!(f, "{}", self.status),
        }
    }
}

/// The cluster resources backing one instance
#[derive(Clone, Debug)]
pub struct K8sInstance {
    pub deployment: Deployment,
    pub service: Service,
}

impl K8sInstance {
    /// Identifier of the instance in the cluster (the Deployment name)
    pub fn compute_id(&self) -> String {
        self.deployment.metadata.name.clone().unwrap_or_default()
    }
}

/// Where a user can reach an instance: one host plus a node port per protocol
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct InstanceNetwork {
    pub host: Option<String>,
    pub ports: BTreeMap<String, i32>,
}

/// Per-resource outcome of deleting an instance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstanceDeletion {
    pub service_deleted: bool,
    pub deployment_deleted: bool,
}

impl InstanceDeletion {
    pub fn is_complete(&self) -> bool {
        self.service_deleted && self.deployment_deleted
    }
}
