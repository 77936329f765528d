// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Scheduler error type
#[derive(Error, Debug, Diagnostic)]
pub enum SchedulerError {
    /// No suitable nodes found
    #[error("No suitable nodes found for pod {pod_name}: {reason}")]
    #[diagnostic(
        code(scheduler::no_suitable_nodes),
        help("Check node resources and whether the application already runs on every node")
    )]
    NoSuitableNodes {
        pod_name: String,
        reason: String,
    },

    /// Normalization was asked to rescale an empty score list
    #[error("Cannot normalize an empty score list")]
    #[diagnostic(
        code(scheduler::empty_score_list),
        help("Normalization runs once after every feasible node has been scored; at least one node must be feasible")
    )]
    EmptyScoreList,

    /// The same node appears more than once in a score list
    #[error("Node {node_name} appears more than once in the score list")]
    #[diagnostic(
        code(scheduler::duplicate_node_score),
        help("Score each feasible node exactly once per scheduling attempt")
    )]
    DuplicateNodeScore {
        node_name: String,
    },

    /// A score function produced a value outside the allowed range
    #[error("Score {score} for node {node_name} is outside [0, {max_score}]")]
    #[diagnostic(
        code(scheduler::score_out_of_range),
        help("Score functions must return values between 0 and the maximum node score")
    )]
    ScoreOutOfRange {
        node_name: String,
        score: i64,
        max_score: i64,
    },

    /// The scheduling attempt was cancelled by the caller
    #[error("Scheduling attempt for pod {pod_name} was cancelled")]
    #[diagnostic(
        code(scheduler::cancelled),
        help("The orchestrator abandoned this attempt; it may retry later")
    )]
    Cancelled {
        pod_name: String,
    },

    /// Core error
    #[error("Core error: {0}")]
    #[diagnostic(
        code(scheduler::core_error),
        help("The pod or node snapshot is malformed")
    )]
    CoreError(#[from] appspread_core::CoreError),

    /// Internal error
    #[error("Internal error: {message}")]
    #[diagnostic(
        code(scheduler::internal_error),
        help("This is likely a bug. Please report it")
    )]
    InternalError {
        message: String,
    },
}

/// Result type for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

impl SchedulerError {
    /// Create a NoSuitableNodes error
    pub fn no_suitable_nodes(pod_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NoSuitableNodes {
            pod_name: pod_name.into(),
            reason: reason.into(),
        }
    }

    /// Create a DuplicateNodeScore error
    pub fn duplicate_node_score(node_name: impl Into<String>) -> Self {
        Self::DuplicateNodeScore {
            node_name: node_name.into(),
        }
    }

    /// Create a ScoreOutOfRange error
    pub fn score_out_of_range(node_name: impl Into<String>, score: i64, max_score: i64) -> Self {
        Self::ScoreOutOfRange {
            node_name: node_name.into(),
            score,
            max_score,
        }
    }

    /// Create a Cancelled error
    pub fn cancelled(pod_name: impl Into<String>) -> Self {
        Self::Cancelled {
            pod_name: pod_name.into(),
        }
    }

    /// Create an InternalError
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}
