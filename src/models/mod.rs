pub mod project;
pub mod task;
pub mod dependency;
pub mod schedule;
pub mod baseline;
pub mod earned_value;

pub use project::*;
pub use task::*;
pub use dependency::*;
pub use schedule::*;
pub use baseline::*;
pub use earned_value::*;
