//! Orchestrator-facing plugin interfaces and the `AppSpread` plugin.
//!
//! Filtering and scoring are separate capabilities. `AppSpread` implements
//! both; its scoring half delegates to a swappable [`ScoreFunction`].

use crate::filter::{ApplicationSpreadFilter, NodeAccounting};
use crate::normalize::normalize_scores;
use crate::score::{default_score_function, ScoreFunction};
use crate::types::{FilterResult, ScoreResult, MAX_NODE_SCORE, MIN_NODE_SCORE};
use crate::{Result, SchedulerError};
use appspread_core::resources::{label, pod_name};
use appspread_core::{NodeInfo, Pod, APPLICATION_NAME_LABEL};
use tracing::debug;

/// Name of the plugin used in registries and configuration
pub const NAME: &str = "AppSpread";

/// A named plugin
pub trait Plugin: Send + Sync {
    /// Stable plugin identifier
    fn name(&self) -> &str;
}

/// Decides whether a node can host a pod
pub trait FilterPlugin: Plugin {
    /// Filter a node for the given pod. Infeasible nodes are a failed
    /// [`FilterResult`], not an error.
    fn filter(&self, pod: &Pod, node: &NodeInfo) -> Result<FilterResult>;
}

/// Ranks feasible nodes for a pod
pub trait ScorePlugin: Plugin {
    /// Raw score in `[0, MAX_NODE_SCORE]` for one feasible node
    fn score(&self, pod: &Pod, node: &NodeInfo) -> Result<ScoreResult>;

    /// Normalization run once over all raw scores of an attempt, if any
    fn score_extensions(&self) -> Option<&dyn ScoreExtensions> {
        None
    }
}

/// Post-processing over the complete raw score list of an attempt
pub trait ScoreExtensions: Send + Sync {
    /// Rescale `scores` in place
    fn normalize_score(&self, pod: &Pod, scores: &mut [ScoreResult]) -> Result<()>;
}

/// Configuration for the `AppSpread` plugin
#[derive(Debug, Clone)]
pub struct AppSpreadConfig {
    /// Label naming a pod's logical application
    pub application_label: String,
    /// How requests of pods already bound to a node are summed
    pub node_accounting: NodeAccounting,
}

impl Default for AppSpreadConfig {
    fn default() -> Self {
        Self {
            application_label: APPLICATION_NAME_LABEL.to_string(),
            node_accounting: NodeAccounting::default(),
        }
    }
}

/// Spreads instances of an application across nodes: admits a node only
/// with enough spare CPU and no pod of the same application, then scores
/// and min-max normalizes the survivors.
pub struct AppSpread {
    filter: ApplicationSpreadFilter,
    score_function: Box<dyn ScoreFunction>,
}

impl AppSpread {
    /// Create the plugin with the default (random) scoring function
    pub fn new(config: AppSpreadConfig) -> Self {
        Self::with_score_function(config, default_score_function())
    }

    /// Create the plugin with a specific scoring function
    pub fn with_score_function(
        config: AppSpreadConfig,
        score_function: Box<dyn ScoreFunction>,
    ) -> Self {
        Self {
            filter: ApplicationSpreadFilter {
                accounting: config.node_accounting,
                application_label: config.application_label,
            },
            score_function,
        }
    }

    /// Name of the scoring function in use
    pub fn score_function_name(&self) -> &str {
        self.score_function.name()
    }
}

impl Plugin for AppSpread {
    fn name(&self) -> &str {
        NAME
    }
}

impl FilterPlugin for AppSpread {
    fn filter(&self, pod: &Pod, node: &NodeInfo) -> Result<FilterResult> {
        debug!(
            "Filtering node {} for pod {} (application: {})",
            node.name(),
            pod_name(pod),
            label(&pod.metadata, &self.filter.application_label).unwrap_or_default()
        );
        self.filter.filter(pod, node)
    }
}

impl ScorePlugin for AppSpread {
    fn score(&self, pod: &Pod, node: &NodeInfo) -> Result<ScoreResult> {
        let score = self.score_function.score(pod, node)?;

        if !(MIN_NODE_SCORE..=MAX_NODE_SCORE).contains(&score) {
            return Err(SchedulerError::score_out_of_range(
                node.name(),
                score,
                MAX_NODE_SCORE,
            ));
        }

        Ok(ScoreResult::new(node.name(), score))
    }

    fn score_extensions(&self) -> Option<&dyn ScoreExtensions> {
        Some(self)
    }
}

impl ScoreExtensions for AppSpread {
    fn normalize_score(&self, pod: &Pod, scores: &mut [ScoreResult]) -> Result<()> {
        debug!(
            "Normalizing {} scores for pod {}",
            scores.len(),
            pod_name(pod)
        );
        normalize_scores(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::REASON_APPLICATION_PRESENT;
    use crate::score::LeastAllocated;
    use appspread_core::testing::{create_test_node_info, create_test_pod};

    struct FixedScore(i64);

    impl ScoreFunction for FixedScore {
        fn score(&self, _pod: &Pod, _node: &NodeInfo) -> Result<i64> {
            Ok(self.0)
        }

        fn name(&self) -> &str {
            "FixedScore"
        }
    }

    #[test]
    fn test_name() {
        let plugin = AppSpread::new(AppSpreadConfig::default());
        assert_eq!(plugin.name(), "AppSpread");
        assert_eq!(plugin.score_function_name(), "RandomScore");
    }

    #[test]
    fn test_filter_delegates() {
        let plugin = AppSpread::new(AppSpreadConfig::default());
        let node = create_test_node_info(
            "node1",
            "4",
            "8Gi",
            vec![create_test_pod("web-0", Some("web"), &[("1", "1Gi")])],
        );
        let pod = create_test_pod("web-1", Some("web"), &[("2", "1Gi")]);

        let result = plugin.filter(&pod, &node).unwrap();
        assert_eq!(result.reason.as_deref(), Some(REASON_APPLICATION_PRESENT));
    }

    #[test]
    fn test_score_uses_score_function() {
        let plugin = AppSpread::with_score_function(
            AppSpreadConfig::default(),
            Box::new(LeastAllocated::default()),
        );
        let node = create_test_node_info("node1", "4", "8Gi", vec![]);
        let pod = create_test_pod("db-0", Some("db"), &[("1", "1Gi")]);

        let result = plugin.score(&pod, &node).unwrap();
        assert_eq!(result, ScoreResult::new("node1", 75));
    }

    #[test]
    fn test_out_of_range_score_is_an_error() {
        let plugin =
            AppSpread::with_score_function(AppSpreadConfig::default(), Box::new(FixedScore(101)));
        let node = create_test_node_info("node1", "4", "8Gi", vec![]);
        let pod = create_test_pod("db-0", Some("db"), &[("1", "1Gi")]);

        let err = plugin.score(&pod, &node).unwrap_err();
        assert!(matches!(err, SchedulerError::ScoreOutOfRange { score: 101, .. }));
    }

    #[test]
    fn test_normalize_through_extensions() {
        let plugin = AppSpread::new(AppSpreadConfig::default());
        let pod = create_test_pod("db-0", Some("db"), &[("1", "1Gi")]);
        let mut scores = vec![
            ScoreResult::new("A", 10),
            ScoreResult::new("B", 90),
            ScoreResult::new("C", 50),
        ];

        let extensions = plugin.score_extensions().unwrap();
        extensions.normalize_score(&pod, &mut scores).unwrap();

        let values: Vec<i64> = scores.iter().map(|s| s.score).collect();
        assert_eq!(values, vec![0, 100, 50]);

        let mut empty: Vec<ScoreResult> = Vec::new();
        assert!(matches!(
            extensions.normalize_score(&pod, &mut empty),
            Err(SchedulerError::EmptyScoreList)
        ));
    }
}
