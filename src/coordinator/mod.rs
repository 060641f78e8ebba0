//! Recompute coordination: a pure per-project state machine, the Tokio
//! shell that runs it, and the per-project lock every schedule or earned
//! value pass takes.

pub mod core;
pub mod locks;
pub mod runtime;

pub use self::core::{NextStep, ProjectSlot, RecomputeState, SlotStats, TriggerOutcome, TriggerReason};
pub use self::locks::ProjectLocks;
pub use self::runtime::{RecomputeCoordinator, RecomputeJob};
