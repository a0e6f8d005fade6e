// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes side of instance provisioning: resource bodies, idempotent
//! managers, node lookups and status derivation.

pub mod client;
pub mod manager;
pub mod namespaces;
pub mod nodes;
pub mod resources;
pub mod status;

pub use client::create_client;
pub use manager::{DeploymentManager, ManagedResource, NamespaceManager, ResourceManager, ServiceManager};
pub use namespaces::namespace_descriptor;
pub use nodes::NodeService;
pub use resources::{AccountRequestHelper, InstanceResources, RequestHelper, ResourceBuilder};
pub use status::{instance_state, ServiceSnapshot};
