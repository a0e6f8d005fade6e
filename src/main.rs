// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use instance_provisioner::config::{Config, ConfigOverrides};
use instance_provisioner::instances::{watch_instance_state, K8sInstanceService};
use instance_provisioner::kubernetes::{create_client, AccountRequestHelper};
use instance_provisioner::types::{InstanceSpec, K8sInstanceStatus};

/// Provision remote desktop instances on Kubernetes
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Namespace holding the instances [env: KUBERNETES_DEFAULT_NAMESPACE]
    #[arg(long, global = true)]
    namespace: Option<String>,

    /// Value of the owner label on created Deployments [env: KUBERNETES_OWNER_LABEL]
    #[arg(long, global = true)]
    owner_label: Option<String>,

    /// Kubeconfig file to use instead of the inferred configuration
    #[arg(long, global = true)]
    kubeconfig: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the instance namespace if it does not exist
    Init,
    /// Create an instance from a YAML or JSON spec file
    Create {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Delete an instance's Service and Deployment
    Delete { name: String },
    /// Print the current state of an instance
    Status { name: String },
    /// Print every state change of an instance until it is ACTIVE
    Watch {
        name: String,
        /// Keep watching once the instance is ACTIVE
        #[arg(long)]
        follow: bool,
    },
    /// Print the host and node ports an instance is reachable on
    Network { name: String },
    /// Print the JSON schema of instance spec files
    Schema,
}

fn print_schema() -> Result<()> {
    let schema = schemars::schema_for!(InstanceSpec);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Schema output needs no cluster
    if let Command::Schema = cli.command {
        return print_schema();
    }

    let config = Config::from_env(ConfigOverrides {
        default_namespace: cli.namespace,
        owner_label: cli.owner_label,
        kubeconfig: cli.kubeconfig,
    })?;
    info!(
        "Configuration loaded: default_namespace={}, owner_label={}",
        config.default_namespace, config.owner_label
    );

    let client = create_client(&config).await?;
    let instances = K8sInstanceService::new(client.clone(), config.clone())
        .with_helper(Arc::new(AccountRequestHelper));

    match cli.command {
        Command::Init => {
            instances.init().await?;
            println!("namespace {} ready", config.default_namespace);
        }
        Command::Create { file } => {
            let document = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let mut spec = InstanceSpec::from_yaml(&document)?;
            if spec.image_pull_secret.is_none() {
                spec.image_pull_secret = config.image_pull_secret.clone();
            }

            let instance = instances.create(&spec).await?;
            println!("instance {} created in {}", instance.compute_id(), config.default_namespace);
        }
        Command::Delete { name } => {
            if !instances.delete(&name).await {
                bail!("instance {} was not fully deleted", name);
            }
            println!("instance {} deleted", name);
        }
        Command::Status { name } => {
            let state = instances.get_state(&name).await?;
            println!("{}", serde_json::to_string(&state)?);
        }
        Command::Watch { name, follow } => {
            watch_instance_state(client, &instances, &name, |state| {
                println!("{}", serde_json::to_string(state).unwrap_or_else(|_| state.to_string()));
                // ERROR may still clear, e.g. once the endpoints catch up
                if state.status == K8sInstanceStatus::Active && !follow {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .await?;
        }
        Command::Network { name } => match instances.network(&name).await? {
            Some(network) => println!("{}", serde_json::to_string(&network)?),
            None => bail!("instance {} has no service", name),
        },
        Command::Schema => print_schema()?,
    }

    Ok(())
}
