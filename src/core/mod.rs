//! # Core Module
//!
//! The deduplication engine.
//!
//! ## Modules
//! - `scanner` - Discovers candidate image files
//! - `hasher` - Computes exact or perceptual signatures
//! - `index` - Partitions images into groups of the same content
//! - `selector` - Picks the survivor of each group
//! - `consolidate` - Moves survivors and deletes duplicates
//! - `pipeline` - Orchestrates the full workflow

pub mod consolidate;
pub mod hasher;
pub mod index;
pub mod pipeline;
pub mod scanner;
pub mod selector;

// Re-export commonly used types
pub use hasher::{DedupMode, Signature};
pub use index::{DedupIndex, Group, GroupId, ImageRecord};
pub use scanner::ImageFile;
pub use selector::{ResolvedGroup, SurvivorSelector};
