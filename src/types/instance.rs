// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::error::{ProvisionerError, Result};
use serde::{Deserialize, Serialize};

/// Everything needed to provision one instance in the cluster
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSpec {
    /// Unique within the namespace; used for the Deployment, Service and `app` label
    pub name: String,
    pub image: Image,
    pub flavour: Flavour,
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_pull_secret: Option<String>,
}

impl InstanceSpec {
    /// Parse a spec document. JSON is a subset of YAML so both are accepted.
    pub fn from_yaml(document: &str) -> Result<Self> {
        serde_yaml::from_str(document).map_err(|e| ProvisionerError::InvalidSpec(e.to_string()))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Registry prefix, e.g. `registry.example.com/desktops`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    pub path: String,
    #[serde(default)]
    pub protocols: Vec<Protocol>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<ImageVolume>>,
}

impl Image {
    /// Container image reference, prefixed with the repository when one is set
    pub fn reference(&self) -> String {
        match self.repository.as_deref() {
            Some(repository) if !repository.is_empty() => format!("{}/{}", repository, self.path),
            _ => self.path.clone(),
        }
    }
}

/// A named port exposed by the image, e.g. `RDP` on 3389
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
pub struct Protocol {
    pub name: String,
    pub port: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageVolume {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub read_only: bool,
}

/// Compute resources granted to an instance
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
pub struct Flavour {
    /// CPU count
    pub cpu: f64,
    /// Memory in MiB
    pub memory: i64,
}

/// The account owning the instance
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub uid: u32,
    pub gid: u32,
    pub home_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
