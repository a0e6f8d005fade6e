// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster client creation and kubeconfig utilities

use crate::config::Config;
use crate::error::{ProvisionerError, Result};
use kube::{
    config::{KubeConfigOptions, Kubeconfig},
    Client, Config as KConfig,
};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Create the client used for every cluster call.
/// An explicit kubeconfig wins over in-cluster / `KUBECONFIG` inference.
#[instrument(skip(config))]
pub async fn create_client(config: &Config) -> Result<Client> {
    match &config.kubeconfig {
        Some(path) => {
            info!("Loading kubeconfig from {}", path.display());
            let kubeconfig = read_kubeconfig(path)?;
            create_client_from_kubeconfig(&kubeconfig).await
        }
        None => {
            debug!("Inferring Kubernetes client configuration");
            let c = KConfig::infer()
                .await
                .map_err(|e| ProvisionerError::KubeconfigError(format!("Failed to infer config: {}", e)))?;
            Client::try_from(c)
                .map_err(|e| ProvisionerError::KubeconfigError(format!("Failed to create client: {}", e)))
        }
    }
}

fn read_kubeconfig(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        ProvisionerError::KubeconfigError(format!("Failed to read {}: {}", path.display(), e))
    })
}

/// Create a Kubernetes client from a kubeconfig string
async fn create_client_from_kubeconfig(kubeconfig: &str) -> Result<Client> {
    let kubeconfig = parse_kubeconfig(kubeconfig)?;

    let client_config = KConfig::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .map_err(|e| ProvisionerError::KubeconfigError(format!("Failed to create config: {}", e)))?;

    Client::try_from(client_config)
        .map_err(|e| ProvisionerError::KubeconfigError(format!("Failed to create client: {}", e)))
}

fn parse_kubeconfig(kubeconfig: &str) -> Result<Kubeconfig> {
    serde_yaml::from_str(kubeconfig)
        .map_err(|e| ProvisionerError::KubeconfigError(format!("Failed to parse kubeconfig: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kubeconfig() {
        let kubeconfig = parse_kubeconfig(
            r#"
apiVersion: v1
kind: Config
clusters:
  - name: test
    cluster:
      server: https://127.0.0.1:6443
contexts:
  - name: test
    context:
      cluster: test
      user: test
current-context: test
users:
  - name: test
    user:
      token: abc
"#,
        )
        .unwrap();

        assert_eq!(kubeconfig.current_context.as_deref(), Some("test"));
        assert_eq!(kubeconfig.clusters.len(), 1);
    }

    #[test]
    fn test_parse_kubeconfig_rejects_garbage() {
        assert!(matches!(
            parse_kubeconfig("clusters: [unterminated"),
            Err(ProvisionerError::KubeconfigError(_))
        ));
    }

    #[test]
    fn test_read_kubeconfig_missing_file() {
        assert!(matches!(
            read_kubeconfig(Path::new("/nonexistent/kubeconfig")),
            Err(ProvisionerError::KubeconfigError(_))
        ));
    }
}
