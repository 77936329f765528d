pub mod quantities;

pub use quantities::{ResourceKind, ResourceQuantities};

use crate::error::{CoreError, Result};
use k8s_openapi::api::core::v1::{Container, Node, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Placeholder used in logs and results for objects without a name
pub const UNKNOWN_NAME: &str = "unknown";

/// Name of an object, or `"unknown"`
pub fn object_name(metadata: &ObjectMeta) -> &str {
    metadata.name.as_deref().unwrap_or(UNKNOWN_NAME)
}

/// Name of a pod, or `"unknown"`
pub fn pod_name(pod: &Pod) -> &str {
    object_name(&pod.metadata)
}

/// Name of a node, or `"unknown"`
pub fn node_name(node: &Node) -> &str {
    object_name(&node.metadata)
}

/// Look up a label value
pub fn label<'a>(metadata: &'a ObjectMeta, key: &str) -> Option<&'a str> {
    metadata
        .labels
        .as_ref()
        .and_then(|labels| labels.get(key))
        .map(String::as_str)
}

/// Containers of a pod; a pod without a spec or without containers is malformed
pub fn containers(pod: &Pod) -> Result<&[Container]> {
    match pod.spec.as_ref().map(|spec| spec.containers.as_slice()) {
        Some(containers) if !containers.is_empty() => Ok(containers),
        _ => Err(CoreError::no_containers(pod_name(pod))),
    }
}

/// Resource requests declared by a single container
pub fn container_requests(container: &Container) -> Result<ResourceQuantities> {
    match container
        .resources
        .as_ref()
        .and_then(|r| r.requests.as_ref())
    {
        Some(requests) => ResourceQuantities::from_k8s_resource_map(requests),
        None => Ok(ResourceQuantities::default()),
    }
}

/// Sum of resource requests across every container of a pod
pub fn pod_requests(pod: &Pod) -> Result<ResourceQuantities> {
    let mut total = ResourceQuantities::default();
    for container in containers(pod)? {
        total += container_requests(container)?;
    }
    Ok(total)
}
