// State management module.
// Holds the dashboard state and the coordinator that loads it.

pub mod dashboard;
pub mod tracker;

pub use dashboard::{CommitSet, DashboardState, LoadPhase, StateScope};
pub use tracker::Tracker;
