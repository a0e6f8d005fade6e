// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProvisionerError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Watch stream error: {0}")]
    WatchError(#[from] kube_runtime::watcher::Error),

    #[error("Failed to load kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("{kind} {name} reported as existing but could not be fetched")]
    ResourceConflict { kind: String, name: String },

    #[error("Invalid instance spec: {0}")]
    InvalidSpec(String),
}

pub type Result<T> = std::result::Result<T, ProvisionerError>;
