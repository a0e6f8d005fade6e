// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Builds the Deployment, Service and Namespace bodies for an instance.
//!
//! Building is pure and cannot fail. Values the cluster would reject (a
//! negative memory size, say) are passed through and surface as API errors.

use crate::constants::{labels, INSTANCE_REPLICAS, SERVICE_TYPE};
use crate::kubernetes::namespaces::namespace_descriptor;
use crate::types::{Image, InstanceSpec, User};
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EmptyDirVolumeSource, EnvVar, LocalObjectReference, Namespace,
    PodSpec, PodTemplateSpec, ResourceRequirements, Service, ServicePort, ServiceSpec, Volume,
    VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;

/// Supplies the account-specific parts of a pod: environment and volumes.
pub trait RequestHelper: Send + Sync {
    fn env_vars(&self, image: &Image, user: &User) -> Vec<EnvVar>;
    fn volumes(&self, image: &Image, user: &User) -> Vec<Volume>;
}

/// Exposes the owning account to the container and backs every image volume
/// with an `emptyDir`.
#[derive(Debug, Default, Clone)]
pub struct AccountRequestHelper;

impl RequestHelper for AccountRequestHelper {
    fn env_vars(&self, _image: &Image, user: &User) -> Vec<EnvVar> {
        let mut vars = vec![
            env_var("USER_UID", user.uid.to_string()),
            env_var("USER_GID", user.gid.to_string()),
            env_var("USER_HOME", user.home_path.clone()),
        ];
        if let Some(username) = &user.username {
            vars.push(env_var("USER_NAME", username.clone()));
        }
        if let Some(email) = &user.email {
            vars.push(env_var("USER_EMAIL", email.clone()));
        }
        vars
    }

    fn volumes(&self, image: &Image, _user: &User) -> Vec<Volume> {
        image
            .volumes
            .iter()
            .flatten()
            .map(|v| Volume {
                name: v.name.clone(),
                empty_dir: Some(EmptyDirVolumeSource::default()),
                ..Default::default()
            })
            .collect()
    }
}

fn env_var(name: &str, value: String) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value),
        ..Default::default()
    }
}

/// The three resources that make up one instance
#[derive(Clone, Debug)]
pub struct InstanceResources {
    pub namespace: Namespace,
    pub deployment: Deployment,
    pub service: Service,
}

/// Turns instance specs into resource bodies
#[derive(Clone, Copy)]
pub struct ResourceBuilder<'a> {
    pub owner_label: &'a str,
    pub namespace: &'a str,
    pub helper: Option<&'a dyn RequestHelper>,
}

impl<'a> ResourceBuilder<'a> {
    pub fn new(owner_label: &'a str, namespace: &'a str) -> Self {
        Self {
            owner_label,
            namespace,
            helper: None,
        }
    }

    pub fn with_helper(mut self, helper: &'a dyn RequestHelper) -> Self {
        self.helper = Some(helper);
        self
    }

    pub fn build(&self, spec: &InstanceSpec) -> InstanceResources {
        InstanceResources {
            namespace: self.build_namespace(),
            deployment: self.deployment(spec),
            service: self.service(spec),
        }
    }

    pub fn build_namespace(&self) -> Namespace {
        namespace_descriptor(self.namespace)
    }

    pub fn deployment(&self, spec: &InstanceSpec) -> Deployment {
        let image = &spec.image;
        let user = &spec.user;

        let resources = BTreeMap::from([
            ("cpu".to_string(), Quantity(format!("{}", spec.flavour.cpu))),
            ("memory".to_string(), Quantity(format!("{}Mi", spec.flavour.memory))),
        ]);

        let container = Container {
            name: spec.name.clone(),
            image: Some(image.reference()),
            ports: Some(container_ports(image)),
            command: image.command.clone().map(|c| vec![c]),
            args: image.args.clone(),
            env: self.helper.map(|h| h.env_vars(image, user)),
            volume_mounts: image.volumes.as_ref().map(|volumes| {
                volumes
                    .iter()
                    .map(|v| VolumeMount {
                        name: v.name.clone(),
                        mount_path: v.path.clone(),
                        read_only: Some(v.read_only),
                        ..Default::default()
                    })
                    .collect()
            }),
            resources: Some(ResourceRequirements {
                limits: Some(resources.clone()),
                requests: Some(resources),
                ..Default::default()
            }),
            ..Default::default()
        };

        Deployment {
            metadata: ObjectMeta {
                name: Some(spec.name.clone()),
                namespace: Some(self.namespace.to_string()),
                labels: Some(self.resource_labels(&spec.name)),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                replicas: Some(INSTANCE_REPLICAS),
                selector: LabelSelector {
                    match_labels: Some(selector_labels(&spec.name)),
                    ..Default::default()
                },
                template: PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(selector_labels(&spec.name)),
                        ..Default::default()
                    }),
                    spec: Some(PodSpec {
                        containers: vec![container],
                        image_pull_secrets: spec.image_pull_secret.as_ref().map(|secret| {
                            vec![LocalObjectReference {
                                name: secret.clone(),
                            }]
                        }),
                        volumes: self.helper.map(|h| h.volumes(image, user)),
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn service(&self, spec: &InstanceSpec) -> Service {
        let ports = container_ports(&spec.image)
            .into_iter()
            .map(|p| ServicePort {
                name: p.name,
                port: p.container_port,
                target_port: Some(IntOrString::Int(p.container_port)),
                ..Default::default()
            })
            .collect();

        Service {
            metadata: ObjectMeta {
                name: Some(spec.name.clone()),
                namespace: Some(self.namespace.to_string()),
                labels: Some(self.resource_labels(&spec.name)),
                ..Default::default()
            },
            spec: Some(ServiceSpec {
                type_: Some(SERVICE_TYPE.to_string()),
                selector: Some(selector_labels(&spec.name)),
                ports: Some(ports),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn resource_labels(&self, name: &str) -> BTreeMap<String, String> {
        let mut resource_labels = selector_labels(name);
        resource_labels.insert(labels::OWNER.to_string(), self.owner_label.to_string());
        resource_labels
    }
}

/// Labels joining an instance's pods to its Service
pub fn selector_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(labels::APP.to_string(), name.to_string())])
}

fn container_ports(image: &Image) -> Vec<ContainerPort> {
    image
        .protocols
        .iter()
        .map(|p| ContainerPort {
            name: Some(p.name.to_lowercase()),
            container_port: p.port,
            ..Default::default()
        })
        .collect()
}

/// All container ports declared on a Deployment's pod template
pub fn deployment_ports(deployment: &Deployment) -> Vec<&ContainerPort> {
    deployment
        .spec
        .as_ref()
        .and_then(|s| s.template.spec.as_ref())
        .map(|pod| {
            pod.containers
                .iter()
                .flat_map(|c| c.ports.iter().flatten())
                .collect()
        })
        .unwrap_or_default()
}

/// Pod template labels of a Deployment
pub fn template_labels(deployment: &Deployment) -> Option<&BTreeMap<String, String>> {
    deployment
        .spec
        .as_ref()
        .and_then(|s| s.template.metadata.as_ref())
        .and_then(|m| m.labels.as_ref())
}
