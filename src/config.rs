// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{env as vars, DEFAULT_NAMESPACE};
use anyhow::{ensure, Context, Result};
use std::env;
use std::path::PathBuf;

/// Provisioner configuration, read once at startup and passed to the orchestrator
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace holding every instance's Deployment and Service
    pub default_namespace: String,
    /// Value of the `owner` label applied to every Deployment
    pub owner_label: String,
    /// Image pull secret used when an instance spec names none
    pub image_pull_secret: Option<String>,
    /// Explicit kubeconfig file; the kube client inference is used otherwise
    pub kubeconfig: Option<PathBuf>,
}

/// Values given on the command line. Each one set wins over its environment variable.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub default_namespace: Option<String>,
    pub owner_label: Option<String>,
    pub kubeconfig: Option<PathBuf>,
}

impl Config {
    pub fn new(default_namespace: impl Into<String>, owner_label: impl Into<String>) -> Result<Self> {
        let default_namespace = default_namespace.into();
        let owner_label = owner_label.into();
        ensure!(!default_namespace.trim().is_empty(), "default namespace must not be empty");
        ensure!(!owner_label.trim().is_empty(), "owner label must not be empty");

        Ok(Config {
            default_namespace,
            owner_label,
            image_pull_secret: None,
            kubeconfig: None,
        })
    }

    /// Load configuration from environment variables, applying `overrides` first
    pub fn from_env(overrides: ConfigOverrides) -> Result<Self> {
        let default_namespace = match overrides.default_namespace {
            Some(namespace) => namespace,
            None => env::var(vars::DEFAULT_NAMESPACE).unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string()),
        };
        let owner_label = match overrides.owner_label {
            Some(label) => label,
            None => env::var(vars::OWNER_LABEL).with_context(|| {
                format!("{} environment variable not set and no --owner-label given", vars::OWNER_LABEL)
            })?,
        };

        let mut config = Config::new(default_namespace, owner_label)?;
        config.image_pull_secret = env::var(vars::IMAGE_PULL_SECRET).ok().filter(|s| !s.is_empty());
        config.kubeconfig = overrides
            .kubeconfig
            .or_else(|| env::var(vars::KUBECONFIG).ok().filter(|s| !s.is_empty()).map(PathBuf::from));
        Ok(config)
    }
}
