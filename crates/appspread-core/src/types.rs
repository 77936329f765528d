use crate::error::{CoreError, Result};
use crate::resources::{node_name, ResourceKind, ResourceQuantities};
use k8s_openapi::api::core::v1::{Node, Pod};
use serde::{Deserialize, Serialize};

/// Label identifying the logical application a pod belongs to
pub const APPLICATION_NAME_LABEL: &str = "applicationName";

/// A node together with the pods already bound to it.
///
/// This is an immutable snapshot for the duration of one scheduling attempt.
/// `pods` only lists workloads committed to the node, never the pod being
/// placed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeInfo {
    /// The node object
    pub node: Node,
    /// Pods currently bound to the node
    #[serde(default)]
    pub pods: Vec<Pod>,
}

impl NodeInfo {
    /// Create a new node snapshot
    pub fn new(node: Node, pods: Vec<Pod>) -> Self {
        Self { node, pods }
    }

    /// Node name, or `"unknown"`
    pub fn name(&self) -> &str {
        node_name(&self.node)
    }

    /// Total capacity from `status.capacity`.
    ///
    /// Both CPU and memory must be reported.
    pub fn capacity(&self) -> Result<ResourceQuantities> {
        let capacity = self
            .node
            .status
            .as_ref()
            .and_then(|s| s.capacity.as_ref())
            .ok_or_else(|| CoreError::missing_capacity(self.name(), "cpu"))?;

        let read = |kind: ResourceKind| -> Result<i64> {
            ResourceQuantities::parse_entry(capacity, kind)?
                .ok_or_else(|| CoreError::missing_capacity(self.name(), kind.as_str()))
        };

        Ok(ResourceQuantities {
            cpu_millicores: read(ResourceKind::Cpu)?,
            memory_bytes: read(ResourceKind::Memory)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::create_test_node;
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

    #[test]
    fn test_capacity() {
        let info = NodeInfo::new(create_test_node("node1", "4", "8Gi"), vec![]);
        let capacity = info.capacity().unwrap();
        assert_eq!(capacity.cpu_millicores, 4000);
        assert_eq!(capacity.memory_bytes, 8 * 1024 * 1024 * 1024);
        assert_eq!(info.name(), "node1");
    }

    #[test]
    fn test_missing_capacity() {
        let mut node = Node::default();
        node.metadata.name = Some("bare".to_string());
        let err = NodeInfo::new(node, vec![]).capacity().unwrap_err();
        assert!(matches!(err, CoreError::MissingCapacity { .. }));

        let mut node = create_test_node("half", "4", "8Gi");
        node.status
            .as_mut()
            .unwrap()
            .capacity
            .as_mut()
            .unwrap()
            .remove("memory");
        let err = NodeInfo::new(node, vec![]).capacity().unwrap_err();
        assert!(err.to_string().contains("memory"));
    }

    #[test]
    fn test_negative_capacity_is_rejected() {
        let mut node = create_test_node("neg", "4", "8Gi");
        node.status
            .as_mut()
            .unwrap()
            .capacity
            .as_mut()
            .unwrap()
            .insert("cpu".to_string(), Quantity("-2".to_string()));
        let err = NodeInfo::new(node, vec![]).capacity().unwrap_err();
        assert!(matches!(err, CoreError::InvalidQuantity { .. }));
    }
}
