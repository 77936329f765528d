use crate::types::{ScoreResult, MAX_NODE_SCORE};
use crate::{Result, SchedulerError};
use std::collections::HashSet;
use tracing::debug;

/// Min-max normalize raw scores in place into `[0, MAX_NODE_SCORE]`.
///
/// The lowest raw score maps to 0 and the highest to `MAX_NODE_SCORE`, using
/// truncating integer division. When every score is equal (including a single
/// node) the lower bound is shifted down by one, so every node gets
/// `MAX_NODE_SCORE`. Node names and their order are left untouched.
pub fn normalize_scores(scores: &mut [ScoreResult]) -> Result<()> {
    let mut seen = HashSet::with_capacity(scores.len());
    for entry in scores.iter() {
        if !seen.insert(entry.node_name.as_str()) {
            return Err(SchedulerError::duplicate_node_score(&entry.node_name));
        }
    }

    let (mut lowest, highest) = scores
        .iter()
        .fold(None, |bounds: Option<(i64, i64)>, entry| match bounds {
            None => Some((entry.score, entry.score)),
            Some((lo, hi)) => Some((lo.min(entry.score), hi.max(entry.score))),
        })
        .ok_or(SchedulerError::EmptyScoreList)?;

    if highest == lowest {
        lowest -= 1;
    }

    let range = i128::from(highest) - i128::from(lowest);
    for entry in scores.iter_mut() {
        let normalized =
            (i128::from(entry.score) - i128::from(lowest)) * i128::from(MAX_NODE_SCORE) / range;
        debug!(
            "Normalized score for node {}: {} -> {}",
            entry.node_name, entry.score, normalized
        );
        entry.score = normalized as i64;
    }

    Ok(())
}
