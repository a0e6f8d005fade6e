// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Label keys put on every instance resource
pub mod labels {
    /// Binds a Deployment's pods to the Service selecting them
    pub const APP: &str = "app";
    /// Identifies the deployment that provisioned the resource
    pub const OWNER: &str = "owner";
}

/// Node role labels used to find the control plane
pub mod node_roles {
    pub const CONTROL_PLANE: &str = "node-role.kubernetes.io/control-plane";
    pub const MASTER: &str = "node-role.kubernetes.io/master";
}

/// Environment variables read by `Config::from_env`
pub mod env {
    pub const DEFAULT_NAMESPACE: &str = "KUBERNETES_DEFAULT_NAMESPACE";
    pub const OWNER_LABEL: &str = "KUBERNETES_OWNER_LABEL";
    pub const IMAGE_PULL_SECRET: &str = "KUBERNETES_IMAGE_PULL_SECRET";
    pub const KUBECONFIG: &str = "KUBERNETES_KUBECONFIG";
}

/// Namespace used when none is configured
pub const DEFAULT_NAMESPACE: &str = "instances";

/// Number of pods backing one instance
pub const INSTANCE_REPLICAS: i32 = 1;

/// Service type used to expose instance protocols
pub const SERVICE_TYPE: &str = "NodePort";
