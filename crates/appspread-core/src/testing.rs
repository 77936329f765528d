//! Fixture builders for tests in this and dependent crates.

use crate::types::{NodeInfo, APPLICATION_NAME_LABEL};
use k8s_openapi::api::core::v1::{Container, Node, NodeStatus, Pod, PodSpec, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;

/// Node named `name` with the given CPU and memory capacity
pub fn create_test_node(name: &str, cpu: &str, memory: &str) -> Node {
    let mut capacity = BTreeMap::new();
    capacity.insert("cpu".to_string(), Quantity(cpu.to_string()));
    capacity.insert("memory".to_string(), Quantity(memory.to_string()));

    let mut node = Node::default();
    node.metadata.name = Some(name.to_string());
    node.status = Some(NodeStatus {
        capacity: Some(capacity),
        ..Default::default()
    });
    node
}

/// Pod with one container per `(cpu, memory)` request pair.
///
/// `app` sets the `applicationName` label.
pub fn create_test_pod(name: &str, app: Option<&str>, requests: &[(&str, &str)]) -> Pod {
    let mut pod = Pod::default();
    pod.metadata.name = Some(name.to_string());
    pod.metadata.namespace = Some("default".to_string());
    if let Some(app) = app {
        let mut labels = BTreeMap::new();
        labels.insert(APPLICATION_NAME_LABEL.to_string(), app.to_string());
        pod.metadata.labels = Some(labels);
    }
    pod.spec = Some(PodSpec::default());

    requests
        .iter()
        .fold(pod, |pod, request| add_test_container(pod, Some(*request)))
}

/// Append a container; `None` means the container declares no requests
pub fn add_test_container(mut pod: Pod, requests: Option<(&str, &str)>) -> Pod {
    let spec = pod.spec.get_or_insert_with(PodSpec::default);
    let mut container = Container {
        name: format!("c{}", spec.containers.len()),
        ..Default::default()
    };

    if let Some((cpu, memory)) = requests {
        let mut map = BTreeMap::new();
        map.insert("cpu".to_string(), Quantity(cpu.to_string()));
        map.insert("memory".to_string(), Quantity(memory.to_string()));
        container.resources = Some(ResourceRequirements {
            requests: Some(map),
            ..Default::default()
        });
    }

    spec.containers.push(container);
    pod
}

/// Node snapshot with bound pods
pub fn create_test_node_info(name: &str, cpu: &str, memory: &str, pods: Vec<Pod>) -> NodeInfo {
    NodeInfo::new(create_test_node(name, cpu, memory), pods)
}
