//! # Consolidate Module
//!
//! Turns resolved groups into a plan of file actions and carries it out.
//!
//! ## Stages
//! 1. **Plan** - one survivor per group is kept in place or moved into the
//!    output directory under a unique name; every other member is deleted
//! 2. **Execute** - groups run concurrently on the worker pool; within a
//!    group the survivor is placed before any delete
//! 3. **Cleanup** - input directories left empty are removed

mod cleanup;
mod executor;
mod planner;
mod types;

pub use cleanup::remove_empty_dirs;
pub use executor::ConsolidateExecutor;
pub use planner::ConsolidationPlanner;
pub use types::*;
