//! # Pipeline Module
//!
//! Orchestrates the full consolidation workflow.
//!
//! ## Pipeline Stages
//! 1. **Scan** - Discover candidate images in every directory
//! 2. **Hash** - Compute signatures in parallel on the worker pool
//! 3. **Group** - Feed signatures to the dedup index in scan order
//! 4. **Plan** - Pick survivors and assign destinations
//! 5. **Consolidate** - Move survivors, delete duplicates (parallel per group)
//! 6. **Cleanup** - Remove input directories left empty
//!
//! ## Parallelism
//! One rayon pool of `jobs` threads serves both the hashing and the
//! consolidation stage. Grouping is the single serialized step.

mod executor;

pub use executor::{Pipeline, PipelineBuilder, PipelineConfig, PipelineResult, DEFAULT_JOBS};
