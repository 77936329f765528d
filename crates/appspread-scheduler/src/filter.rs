use crate::types::FilterResult;
use crate::Result;
use appspread_core::resources::{container_requests, containers, label, pod_name, pod_requests};
use appspread_core::{NodeInfo, Pod, ResourceQuantities, APPLICATION_NAME_LABEL};
use tracing::debug;

/// Rejection reason when the node lacks CPU headroom for the pod
pub const REASON_INSUFFICIENT_RESOURCES: &str = "insufficient resources";

/// Rejection reason when the pod's application already runs on the node
pub const REASON_APPLICATION_PRESENT: &str = "application already present on node";

/// How the requests of pods already bound to a node are summed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NodeAccounting {
    /// Only the first container of every bound pod is counted
    #[default]
    FirstContainer,
    /// Every container of every bound pod is counted
    AllContainers,
}

/// Resource view of a node at the start of a filter call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeResources {
    /// Total capacity
    pub capacity: ResourceQuantities,
    /// Requests of the pods already bound to the node
    pub consumed: ResourceQuantities,
    /// Capacity minus consumed. Memory is carried but never gates admission.
    pub available: ResourceQuantities,
}

impl NodeResources {
    /// Account the node's bound pods against its capacity
    pub fn compute(node: &NodeInfo, accounting: NodeAccounting) -> Result<Self> {
        let capacity = node.capacity()?;

        let counted = match accounting {
            NodeAccounting::FirstContainer => 1,
            NodeAccounting::AllContainers => usize::MAX,
        };

        let mut consumed = ResourceQuantities::default();
        for pod in &node.pods {
            for container in containers(pod)?.iter().take(counted) {
                consumed += container_requests(container)?;
            }
        }

        Ok(Self {
            capacity,
            consumed,
            available: capacity.saturating_sub(&consumed),
        })
    }
}

/// Find a pod bound to `node` that belongs to the same application as `pod`.
///
/// A candidate without the application label never conflicts.
pub fn find_colocated<'a>(pod: &Pod, node: &'a NodeInfo, label_key: &str) -> Option<&'a Pod> {
    let application = label(&pod.metadata, label_key)?;
    node.pods
        .iter()
        .find(|bound| label(&bound.metadata, label_key) == Some(application))
}

/// Admission filter: CPU headroom first, then application co-location
#[derive(Debug, Clone)]
pub struct ApplicationSpreadFilter {
    /// Accounting mode for pods already on the node
    pub accounting: NodeAccounting,
    /// Label naming a pod's logical application
    pub application_label: String,
}

impl Default for ApplicationSpreadFilter {
    fn default() -> Self {
        Self {
            accounting: NodeAccounting::default(),
            application_label: APPLICATION_NAME_LABEL.to_string(),
        }
    }
}

impl ApplicationSpreadFilter {
    /// Decide whether `pod` may be placed on `node`.
    ///
    /// Rejections are `Ok` results; only malformed input is an `Err`.
    pub fn filter(&self, pod: &Pod, node: &NodeInfo) -> Result<FilterResult> {
        let node_name = node.name().to_string();
        let resources = NodeResources::compute(node, self.accounting)?;
        let requested = pod_requests(pod)?;

        debug!(
            "Node {} capacity CPU: {} milli, consumed: {} milli, available: {} milli, available memory: {} bytes",
            node_name,
            resources.capacity.cpu_millicores,
            resources.consumed.cpu_millicores,
            resources.available.cpu_millicores,
            resources.available.memory_bytes
        );
        debug!(
            "Pod {} requests CPU: {} milli, Memory: {} bytes",
            pod_name(pod),
            requested.cpu_millicores,
            requested.memory_bytes
        );

        if resources.available.cpu_millicores <= requested.cpu_millicores {
            debug!(
                "Node {} cannot run pod {}: available {} milli, requested {} milli",
                node_name,
                pod_name(pod),
                resources.available.cpu_millicores,
                requested.cpu_millicores
            );
            return Ok(FilterResult::fail(
                node_name,
                REASON_INSUFFICIENT_RESOURCES.to_string(),
            ));
        }

        if let Some(existing) = find_colocated(pod, node, &self.application_label) {
            debug!(
                "Application {} already present on node {} as pod {}",
                label(&pod.metadata, &self.application_label).unwrap_or_default(),
                node_name,
                pod_name(existing)
            );
            return Ok(FilterResult::fail(
                node_name,
                REASON_APPLICATION_PRESENT.to_string(),
            ));
        }

        Ok(FilterResult::pass(node_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SchedulerError;
    use appspread_core::testing::{add_test_container, create_test_node_info, create_test_pod};
    use appspread_core::CoreError;

    fn bound_web_pod() -> Pod {
        create_test_pod("web-0", Some("web"), &[("1", "1Gi")])
    }

    #[test]
    fn test_rejects_same_application() {
        let node = create_test_node_info("node1", "4", "8Gi", vec![bound_web_pod()]);
        let pod = create_test_pod("web-1", Some("web"), &[("2", "1Gi")]);

        let result = ApplicationSpreadFilter::default().filter(&pod, &node).unwrap();

        assert!(!result.passed);
        assert_eq!(result.reason.as_deref(), Some(REASON_APPLICATION_PRESENT));
    }

    #[test]
    fn test_admits_different_application() {
        let node = create_test_node_info("node1", "4", "8Gi", vec![bound_web_pod()]);
        let pod = create_test_pod("db-0", Some("db"), &[("2", "1Gi")]);

        let result = ApplicationSpreadFilter::default().filter(&pod, &node).unwrap();

        assert!(result.passed);
        assert_eq!(result.node_name, "node1");
    }

    #[test]
    fn test_rejects_insufficient_cpu() {
        let bound = create_test_pod("other-0", Some("other"), &[("1", "1Gi")]);
        let node = create_test_node_info("node1", "2", "8Gi", vec![bound]);
        let pod = create_test_pod("db-0", Some("db"), &[("2", "1Gi")]);

        let result = ApplicationSpreadFilter::default().filter(&pod, &node).unwrap();

        assert!(!result.passed);
        assert_eq!(result.reason.as_deref(), Some(REASON_INSUFFICIENT_RESOURCES));
    }

    #[test]
    fn test_exact_fit_is_rejected() {
        // available 3 == requested 3
        let node = create_test_node_info("node1", "4", "8Gi", vec![bound_web_pod()]);
        let pod = create_test_pod("db-0", Some("db"), &[("2", "1Gi"), ("1", "1Gi")]);

        let result = ApplicationSpreadFilter::default().filter(&pod, &node).unwrap();

        assert_eq!(result.reason.as_deref(), Some(REASON_INSUFFICIENT_RESOURCES));
    }

    #[test]
    fn test_resource_check_precedes_colocation() {
        let node = create_test_node_info("node1", "2", "8Gi", vec![bound_web_pod()]);
        let pod = create_test_pod("web-1", Some("web"), &[("2", "1Gi")]);

        let result = ApplicationSpreadFilter::default().filter(&pod, &node).unwrap();

        assert_eq!(result.reason.as_deref(), Some(REASON_INSUFFICIENT_RESOURCES));
    }

    #[test]
    fn test_memory_does_not_gate_admission() {
        let node = create_test_node_info("node1", "4", "1Mi", vec![bound_web_pod()]);
        let pod = create_test_pod("db-0", Some("db"), &[("1", "4Gi")]);

        let result = ApplicationSpreadFilter::default().filter(&pod, &node).unwrap();

        assert!(result.passed);
        let resources = NodeResources::compute(&node, NodeAccounting::FirstContainer).unwrap();
        assert!(resources.available.memory_bytes < 0);
    }

    #[test]
    fn test_fractional_and_exponent_quantities_are_admitted() {
        let bound = create_test_pod("web-0", Some("web"), &[("1", "1.5Gi")]);
        let node = create_test_node_info("node1", "4", "1e10", vec![bound]);
        let pod = create_test_pod("db-0", Some("db"), &[("2", "0.5Gi")]);

        let result = ApplicationSpreadFilter::default().filter(&pod, &node).unwrap();
        assert!(result.passed);

        let resources = NodeResources::compute(&node, NodeAccounting::FirstContainer).unwrap();
        assert_eq!(resources.capacity.memory_bytes, 10_000_000_000);
        assert_eq!(resources.consumed.memory_bytes, 3 * 512 * 1024 * 1024);
    }

    #[test]
    fn test_accounting_modes() {
        // Bound pod: first container 1 CPU, sidecar 2 CPU
        let bound = create_test_pod("web-0", Some("web"), &[("1", "1Gi"), ("2", "1Gi")]);
        let node = create_test_node_info("node1", "4", "8Gi", vec![bound]);
        let pod = create_test_pod("db-0", Some("db"), &[("2", "1Gi")]);

        let legacy = NodeResources::compute(&node, NodeAccounting::FirstContainer).unwrap();
        assert_eq!(legacy.consumed.cpu_millicores, 1000);
        assert_eq!(legacy.available.cpu_millicores, 3000);

        let full = NodeResources::compute(&node, NodeAccounting::AllContainers).unwrap();
        assert_eq!(full.consumed.cpu_millicores, 3000);
        assert_eq!(full.available.cpu_millicores, 1000);

        let first = ApplicationSpreadFilter::default();
        assert!(first.filter(&pod, &node).unwrap().passed);

        let all = ApplicationSpreadFilter {
            accounting: NodeAccounting::AllContainers,
            ..Default::default()
        };
        let result = all.filter(&pod, &node).unwrap();
        assert_eq!(result.reason.as_deref(), Some(REASON_INSUFFICIENT_RESOURCES));
    }

    #[test]
    fn test_repeated_calls_do_not_accumulate() {
        let node = create_test_node_info("node1", "4", "8Gi", vec![bound_web_pod()]);
        let pod = create_test_pod("db-0", Some("db"), &[("2", "1Gi")]);
        let filter = ApplicationSpreadFilter::default();

        for _ in 0..3 {
            assert!(filter.filter(&pod, &node).unwrap().passed);
        }
    }

    #[test]
    fn test_unlabelled_pod_is_not_colocated() {
        let node = create_test_node_info("node1", "4", "8Gi", vec![bound_web_pod()]);
        let pod = create_test_pod("anon", None, &[("1", "1Gi")]);

        assert!(find_colocated(&pod, &node, APPLICATION_NAME_LABEL).is_none());
        assert!(ApplicationSpreadFilter::default().filter(&pod, &node).unwrap().passed);
    }

    #[test]
    fn test_custom_application_label() {
        let mut bound = create_test_pod("web-0", None, &[("1", "1Gi")]);
        bound.metadata.labels = Some(
            [("app".to_string(), "web".to_string())].into_iter().collect(),
        );
        let mut pod = create_test_pod("web-1", None, &[("1", "1Gi")]);
        pod.metadata.labels = bound.metadata.labels.clone();
        let node = create_test_node_info("node1", "4", "8Gi", vec![bound]);

        let filter = ApplicationSpreadFilter {
            application_label: "app".to_string(),
            ..Default::default()
        };
        let result = filter.filter(&pod, &node).unwrap();
        assert_eq!(result.reason.as_deref(), Some(REASON_APPLICATION_PRESENT));
    }

    #[test]
    fn test_pod_without_containers_is_an_error() {
        let node = create_test_node_info("node1", "4", "8Gi", vec![]);
        let pod = create_test_pod("empty", Some("web"), &[]);

        let err = ApplicationSpreadFilter::default().filter(&pod, &node).unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::CoreError(CoreError::NoContainers { .. })
        ));
    }

    #[test]
    fn test_bound_pod_without_containers_is_an_error() {
        let node = create_test_node_info(
            "node1",
            "4",
            "8Gi",
            vec![create_test_pod("broken", Some("web"), &[])],
        );
        let pod = create_test_pod("db-0", Some("db"), &[("1", "1Gi")]);

        assert!(ApplicationSpreadFilter::default().filter(&pod, &node).is_err());
    }

    #[test]
    fn test_malformed_quantities_are_errors() {
        let node = create_test_node_info("node1", "four", "8Gi", vec![]);
        let pod = create_test_pod("db-0", Some("db"), &[("1", "1Gi")]);
        assert!(ApplicationSpreadFilter::default().filter(&pod, &node).is_err());

        let node = create_test_node_info("node1", "4", "8Gi", vec![]);
        let pod = create_test_pod("db-0", Some("db"), &[("-1", "1Gi")]);
        assert!(ApplicationSpreadFilter::default().filter(&pod, &node).is_err());
    }

    #[test]
    fn test_container_without_requests_counts_as_zero() {
        let bound = add_test_container(create_test_pod("web-0", Some("web"), &[]), None);
        let node = create_test_node_info("node1", "1", "8Gi", vec![bound]);
        let pod = create_test_pod("db-0", Some("db"), &[("500m", "1Gi")]);

        assert!(ApplicationSpreadFilter::default().filter(&pod, &node).unwrap().passed);
    }
}
