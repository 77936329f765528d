//! Appspread Scheduler - application-spreading placement policy
//!
//! This crate provides:
//! - Plugin interfaces for filtering and scoring nodes
//! - The `AppSpread` plugin (CPU admission, application co-location exclusion)
//! - Scoring functions (random, least allocated)
//! - Min-max score normalization
//! - A per-attempt scheduler that fans out per-node calls with cancellation

pub mod error;
pub mod filter;
pub mod normalize;
pub mod plugin;
pub mod scheduler;
pub mod score;
pub mod types;

// Re-export commonly used types
pub use error::{Result, SchedulerError};
pub use filter::NodeAccounting;
pub use plugin::{AppSpread, AppSpreadConfig, FilterPlugin, Plugin, ScoreExtensions, ScorePlugin};
pub use scheduler::{ScheduleResult, Scheduler, SchedulerConfig};
pub use types::{FilterResult, NodeScoreList, SchedulingContext, ScoreResult, MAX_NODE_SCORE};
