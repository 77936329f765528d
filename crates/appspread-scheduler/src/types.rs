use appspread_core::{NodeInfo, Pod};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Lowest score a node can receive
pub const MIN_NODE_SCORE: i64 = 0;

/// Highest score a node can receive, both raw and after normalization
pub const MAX_NODE_SCORE: i64 = 100;

/// Scheduling context containing the pod and the candidate nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingContext {
    /// Pod to be scheduled
    pub pod: Pod,
    /// Candidate nodes with their bound pods
    pub nodes: Vec<NodeInfo>,
}

impl SchedulingContext {
    /// Create a new scheduling context
    pub fn new(pod: Pod, nodes: Vec<NodeInfo>) -> Self {
        Self { pod, nodes }
    }

    /// Split into shared, read-only handles for a concurrent scheduling cycle
    pub fn into_shared(self) -> (Arc<Pod>, Vec<Arc<NodeInfo>>) {
        (
            Arc::new(self.pod),
            self.nodes.into_iter().map(Arc::new).collect(),
        )
    }
}

/// Result of filtering a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterResult {
    /// Node name
    pub node_name: String,
    /// Whether the node passed the filter
    pub passed: bool,
    /// Reason for failure (if any)
    pub reason: Option<String>,
}

impl FilterResult {
    /// Create a passing filter result
    pub fn pass(node_name: String) -> Self {
        Self {
            node_name,
            passed: true,
            reason: None,
        }
    }

    /// Create a failing filter result
    pub fn fail(node_name: String, reason: String) -> Self {
        Self {
            node_name,
            passed: false,
            reason: Some(reason),
        }
    }
}

/// Score of a single node; raw after scoring, rescaled after normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Node name
    pub node_name: String,
    /// Score (0-100, higher is better)
    pub score: i64,
}

impl ScoreResult {
    /// Create a new score result
    pub fn new(node_name: impl Into<String>, score: i64) -> Self {
        Self {
            node_name: node_name.into(),
            score,
        }
    }
}

/// Ordered per-node scores for one scheduling attempt
pub type NodeScoreList = Vec<ScoreResult>;
