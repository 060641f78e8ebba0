pub mod builder;
pub mod cycle;
pub mod topo;

pub use builder::ProjectGraph;
pub use topo::topological_order;
