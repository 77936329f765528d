use crate::filter::{NodeAccounting, NodeResources};
use crate::types::{MAX_NODE_SCORE, MIN_NODE_SCORE};
use crate::Result;
use appspread_core::resources::{pod_name, pod_requests};
use appspread_core::{NodeInfo, Pod};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Scoring function trait
pub trait ScoreFunction: Send + Sync {
    /// Score a feasible node for the given pod (0-100, higher is better).
    ///
    /// Must not depend on other nodes or on the order of calls.
    fn score(&self, pod: &Pod, node: &NodeInfo) -> Result<i64>;

    /// Name of the scoring function
    fn name(&self) -> &str;
}

/// Uniformly random score, independent of resources.
///
/// Every call builds its own generator. Unseeded calls draw from OS entropy;
/// seeded calls derive their generator from the seed, the pod name and the
/// node name, so repeated attempts are reproducible regardless of call order.
#[derive(Debug, Clone, Default)]
pub struct RandomScore {
    seed: Option<u64>,
}

impl RandomScore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reproducible scores for a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    fn rng_for(&self, pod: &Pod, node: &NodeInfo) -> StdRng {
        match self.seed {
            Some(seed) => {
                let key = fnv1a(FNV_OFFSET, pod_name(pod).as_bytes());
                let key = fnv1a(key, node.name().as_bytes());
                StdRng::seed_from_u64(seed ^ key)
            }
            None => StdRng::from_entropy(),
        }
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

// Stable across builds, unlike `DefaultHasher`
fn fnv1a(mut hash: u64, bytes: &[u8]) -> u64 {
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

impl ScoreFunction for RandomScore {
    fn score(&self, pod: &Pod, node: &NodeInfo) -> Result<i64> {
        let score = self
            .rng_for(pod, node)
            .gen_range(MIN_NODE_SCORE..=MAX_NODE_SCORE);

        debug!("Scoring node {} for pod {}: {}", node.name(), pod_name(pod), score);

        Ok(score)
    }

    fn name(&self) -> &str {
        "RandomScore"
    }
}

/// Score based on CPU headroom left after placing the pod.
///
/// `(available - requested) * 100 / capacity`, clamped to 0-100.
#[derive(Debug, Clone, Default)]
pub struct LeastAllocated {
    /// Accounting mode for pods already on the node
    pub accounting: NodeAccounting,
}

impl ScoreFunction for LeastAllocated {
    fn score(&self, pod: &Pod, node: &NodeInfo) -> Result<i64> {
        let resources = NodeResources::compute(node, self.accounting)?;
        let requested = pod_requests(pod)?;

        // If node has no CPU, score 0
        if resources.capacity.cpu_millicores == 0 {
            return Ok(MIN_NODE_SCORE);
        }

        let remaining = resources
            .available
            .cpu_millicores
            .saturating_sub(requested.cpu_millicores);
        let score = (i128::from(remaining) * i128::from(MAX_NODE_SCORE)
            / i128::from(resources.capacity.cpu_millicores))
        .clamp(i128::from(MIN_NODE_SCORE), i128::from(MAX_NODE_SCORE)) as i64;

        debug!(
            "Node {} score: {} (remaining CPU: {} of {} milli)",
            node.name(),
            score,
            remaining,
            resources.capacity.cpu_millicores
        );

        Ok(score)
    }

    fn name(&self) -> &str {
        "LeastAllocated"
    }
}

/// Get the default scoring function
pub fn default_score_function() -> Box<dyn ScoreFunction> {
    Box::new(RandomScore::new())
}
