//! Critical path scheduling and earned value engine.
//!
//! Builds a validated dependency graph per project, runs the CPM forward and
//! backward passes under date constraints, captures locked baselines and
//! computes earned value metrics against the active one. Recomputes are
//! coalesced per project by [`coordinator::RecomputeCoordinator`].

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod db;
pub mod engine;
pub mod error;
pub mod evm;
pub mod graph;
pub mod logging;
pub mod models;
pub mod output;
pub mod schedule;

pub use engine::ScheduleEngine;
pub use error::{EngineError, ErrorCode, Result};
