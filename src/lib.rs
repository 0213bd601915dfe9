//! # Image Consolidator
//!
//! Merges several image directories into one, keeping a single copy of every
//! distinct image.
//!
//! ## Core Philosophy
//! - **Never lose a survivor** - duplicates are deleted only after the kept
//!   copy is safely in place
//! - **Deterministic** - the same inputs always keep the same files
//! - **Isolate failures** - one bad file or group never aborts the run
//!
//! ## Architecture
//! - `core` - The deduplication engine
//! - `events` - Event-driven progress reporting
//! - `error` - Error types

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{ConsolidatorError, Result};

use tracing_subscriber::EnvFilter;

/// Map a `-v` level (0-5) to a tracing filter directive
pub fn verbosity_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "off",
        1 => "error",
        2 => "warn",
        3 => "info",
        4 => "debug",
        _ => "trace",
    }
}

/// Initialize tracing for the library
///
/// `RUST_LOG` takes precedence over `verbosity` when set. Calling this twice
/// is harmless; the first subscriber stays installed.
pub fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity_filter(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
