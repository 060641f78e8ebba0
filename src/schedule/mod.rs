pub mod constraint;
pub mod cpm;

pub use constraint::{ConstraintBounds, ConstraintResolver};
pub use cpm::compute_schedule;
