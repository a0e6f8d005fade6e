// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster node lookups, used to tell users where instances can be reached.

use crate::constants::node_roles;
use crate::error::Result;
use crate::kubernetes::manager::ResourceManager;
use k8s_openapi::api::core::v1::Node;
use kube::{Client, ResourceExt};
use tracing::{debug, instrument};

/// Address types in order of preference
const ADDRESS_PREFERENCE: [&str; 3] = ["ExternalIP", "InternalIP", "Hostname"];

#[derive(Clone)]
pub struct NodeService {
    nodes: ResourceManager<Node>,
}

impl NodeService {
    pub fn new(client: Client) -> Self {
        Self {
            nodes: ResourceManager::new(client),
        }
    }

    pub async fn list(&self) -> Result<Vec<Node>> {
        self.nodes.list("").await
    }

    pub async fn get(&self, name: &str) -> Result<Option<Node>> {
        self.nodes.get(name, "").await
    }

    /// The first control plane node, if any is labelled as such
    #[instrument(skip(self))]
    pub async fn master(&self) -> Result<Option<Node>> {
        let master = self.list().await?.into_iter().find(is_master);
        if let Some(node) = &master {
            debug!("Found master node {}", node.name_any());
        }
        Ok(master)
    }
}

pub fn is_master(node: &Node) -> bool {
    let labels = node.labels();
    labels.contains_key(node_roles::CONTROL_PLANE) || labels.contains_key(node_roles::MASTER)
}

/// Best address to reach a node on
pub fn node_address(node: &Node) -> Option<String> {
    let addresses = node.status.as_ref()?.addresses.as_ref()?;
    ADDRESS_PREFERENCE.iter().find_map(|wanted| {
        addresses
            .iter()
            .find(|a| a.type_ == *wanted)
            .map(|a| a.address.clone())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockService;
    use k8s_openapi::api::core::v1::{NodeAddress, NodeStatus};
    use kube::api::ObjectMeta;
    use std::collections::BTreeMap;

    fn make_node(name: &str, role: Option<&str>, addresses: &[(&str, &str)]) -> Node {
        Node {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                labels: role.map(|r| BTreeMap::from([(r.to_string(), String::new())])),
                ..Default::default()
            },
            status: Some(NodeStatus {
                addresses: Some(
                    addresses
                        .iter()
                        .map(|(type_, address)| NodeAddress {
                            type_: type_.to_string(),
                            address: address.to_string(),
                        })
                        .collect(),
                ),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn node_list_json(nodes: &[Node]) -> String {
        serde_json::json!({
            "apiVersion": "v1",
            "kind": "NodeList",
            "metadata": {},
            "items": nodes,
        })
        .to_string()
    }

    #[test]
    fn test_is_master() {
        assert!(is_master(&make_node("a", Some(node_roles::CONTROL_PLANE), &[])));
        assert!(is_master(&make_node("b", Some(node_roles::MASTER), &[])));
        assert!(!is_master(&make_node("c", None, &[])));
    }

    #[test]
    fn test_node_address_prefers_external_ip() {
        let node = make_node(
            "a",
            None,
            &[("Hostname", "k8s-1"), ("InternalIP", "10.0.0.1"), ("ExternalIP", "192.0.2.1")],
        );
        assert_eq!(node_address(&node).as_deref(), Some("192.0.2.1"));
    }

    #[test]
    fn test_node_address_falls_back() {
        let node = make_node("a", None, &[("Hostname", "k8s-1"), ("InternalIP", "10.0.0.1")]);
        assert_eq!(node_address(&node).as_deref(), Some("10.0.0.1"));

        let node = make_node("a", None, &[("Hostname", "k8s-1")]);
        assert_eq!(node_address(&node).as_deref(), Some("k8s-1"));

        assert_eq!(node_address(&Node::default()), None);
    }

    #[tokio::test]
    async fn test_master_found_in_list() {
        let nodes = [
            make_node("k8s-test-worker-1", None, &[]),
            make_node("k8s-test-master-1", Some(node_roles::CONTROL_PLANE), &[]),
        ];
        let client = MockService::new()
            .on_get("/api/v1/nodes", 200, &node_list_json(&nodes))
            .into_client();

        let master = NodeService::new(client).master().await.unwrap().unwrap();
        assert_eq!(master.name_any(), "k8s-test-master-1");
    }

    #[tokio::test]
    async fn test_get_absent_node_is_none() {
        let service = NodeService::new(MockService::new().into_client());
        assert!(service.get("k8s-test-no-1").await.unwrap().is_none());
    }
}
