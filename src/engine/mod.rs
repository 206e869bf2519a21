//! Event reconciliation
//!
//! The cache of handled plays, the per-snapshot reconciliation pass and the
//! end-of-game checklist.

pub mod cache;
pub mod finalize;
pub mod reconcile;
pub mod strength;

pub use cache::{CachedEventRecord, EventCache};
pub use finalize::FinalizeStatus;
pub use reconcile::{recorded_goal, CycleReport, EngineConfig, ReconciliationEngine};
pub use strength::PenaltyStrength;
