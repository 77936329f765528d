use crate::plugin::{FilterPlugin, ScorePlugin};
use crate::types::{FilterResult, NodeScoreList, ScoreResult};
use crate::{Result, SchedulerError};
use appspread_core::resources::pod_name;
use appspread_core::{NodeInfo, Pod};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Configuration for the scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum number of per-node filter or score calls in flight
    pub parallelism: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { parallelism: 16 }
    }
}

/// Outcome of one scheduling attempt
#[derive(Debug, Clone)]
pub struct ScheduleResult {
    /// Filter verdict for every candidate node, in input order
    pub filter_results: Vec<FilterResult>,
    /// Normalized scores for the feasible nodes, in input order
    pub scores: NodeScoreList,
}

impl ScheduleResult {
    /// Highest scoring node; the first one wins ties
    pub fn best_node(&self) -> Option<&ScoreResult> {
        self.scores
            .iter()
            .reduce(|best, s| if s.score > best.score { s } else { best })
    }

    /// Number of nodes that passed filtering
    pub fn feasible_count(&self) -> usize {
        self.scores.len()
    }
}

/// Runs the filter, score and normalize stages for one pod.
///
/// Per-node calls fan out on a `JoinSet`; each stage is a barrier for the
/// next. Cancellation is observed between per-node calls.
pub struct Scheduler {
    config: SchedulerConfig,
    filter: Arc<dyn FilterPlugin>,
    scorer: Arc<dyn ScorePlugin>,
}

impl Scheduler {
    /// Create a new scheduler from a filter and a score plugin
    pub fn new(
        filter: Arc<dyn FilterPlugin>,
        scorer: Arc<dyn ScorePlugin>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            config,
            filter,
            scorer,
        }
    }

    /// Run one scheduling attempt for `pod` over `nodes`
    pub async fn schedule(
        &self,
        pod: Arc<Pod>,
        nodes: &[Arc<NodeInfo>],
        token: &CancellationToken,
    ) -> Result<ScheduleResult> {
        let pod_name = pod_name(&pod).to_string();

        info!(
            "Scheduling pod {} across {} candidate nodes",
            pod_name,
            nodes.len()
        );

        // Phase 1: Filter nodes
        let filter = self.filter.clone();
        let filter_pod = pod.clone();
        let filter_results = self
            .for_each_node(&pod_name, nodes, token, move |node: &NodeInfo| {
                filter.filter(&filter_pod, node)
            })
            .await?;

        let mut feasible_nodes = Vec::new();
        for (node, result) in nodes.iter().zip(&filter_results) {
            if result.passed {
                feasible_nodes.push(node.clone());
            } else {
                debug!(
                    "Node {} filtered out by {}: {}",
                    result.node_name,
                    self.filter.name(),
                    result.reason.as_deref().unwrap_or_default()
                );
            }
        }

        if feasible_nodes.is_empty() {
            warn!("No feasible nodes for pod {}", pod_name);
            let reason = filter_results
                .iter()
                .map(|r| format!("{}: {}", r.node_name, r.reason.as_deref().unwrap_or_default()))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(SchedulerError::no_suitable_nodes(
                pod_name,
                if reason.is_empty() {
                    "no candidate nodes".to_string()
                } else {
                    reason
                },
            ));
        }

        info!(
            "Pod {} has {} feasible nodes",
            pod_name,
            feasible_nodes.len()
        );

        // Phase 2: Score feasible nodes
        let scorer = self.scorer.clone();
        let score_pod = pod.clone();
        let mut scores = self
            .for_each_node(&pod_name, &feasible_nodes, token, move |node: &NodeInfo| {
                scorer.score(&score_pod, node)
            })
            .await?;

        if token.is_cancelled() {
            return Err(SchedulerError::cancelled(pod_name));
        }

        // Phase 3: Normalize once over the complete score list
        if let Some(extensions) = self.scorer.score_extensions() {
            extensions.normalize_score(&pod, &mut scores)?;
        }

        let result = ScheduleResult {
            filter_results,
            scores,
        };

        if let Some(best) = result.best_node() {
            info!(
                "Best node for pod {} is {} with score {}",
                pod_name, best.node_name, best.score
            );
        }

        Ok(result)
    }

    /// Apply `f` to every node concurrently, returning results in node order.
    ///
    /// Stops at the first error or on cancellation; outstanding calls are
    /// aborted when the `JoinSet` is dropped.
    async fn for_each_node<T, F>(
        &self,
        pod_name: &str,
        nodes: &[Arc<NodeInfo>],
        token: &CancellationToken,
        f: F,
    ) -> Result<Vec<T>>
    where
        T: Send + 'static,
        F: Fn(&NodeInfo) -> Result<T> + Clone + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));
        let mut tasks = JoinSet::new();

        for (index, node) in nodes.iter().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    return Err(SchedulerError::cancelled(pod_name));
                }
                permit = semaphore.clone().acquire_owned() => permit.map_err(|e| {
                    SchedulerError::internal_error(format!("Semaphore closed: {}", e))
                })?,
            };

            let node = node.clone();
            let f = f.clone();
            tasks.spawn(async move {
                let _permit = permit;
                (index, f(node.as_ref()))
            });
        }

        let mut slots: Vec<Option<T>> = (0..nodes.len()).map(|_| None).collect();

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tasks.abort_all();
                    return Err(SchedulerError::cancelled(pod_name));
                }
                joined = tasks.join_next() => match joined {
                    Some(Ok((index, result))) => slots[index] = Some(result?),
                    Some(Err(e)) => {
                        return Err(SchedulerError::internal_error(format!(
                            "Per-node task failed: {}",
                            e
                        )));
                    }
                    None => break,
                },
            }
        }

        slots
            .into_iter()
            .collect::<Option<Vec<T>>>()
            .ok_or_else(|| SchedulerError::internal_error("Missing per-node result"))
    }
}
