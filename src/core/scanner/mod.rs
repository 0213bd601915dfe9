//! # Scanner Module
//!
//! Discovers candidate image files in the input directories.
//!
//! Candidates are selected by extension; whether a file really is an image is
//! only known once the hasher decodes it.
//!
//! ## Example
//! ```rust,ignore
//! use image_consolidator::core::scanner::{ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! for file in scanner.walk(Path::new("/photos"), 0) {
//!     println!("{:?}", file?.path);
//! }
//! ```

mod filter;
mod walker;

pub use filter::ImageFilter;
pub(crate) use filter::is_hidden;
pub use walker::{ScanConfig, ScanIter, WalkDirScanner};

use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A discovered image candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFile {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Position of the source directory in argument order
    pub source_index: usize,
    /// The input directory the file was found under
    pub source_dir: PathBuf,
}

/// Result of scanning every input directory
#[derive(Debug)]
pub struct ScanResult {
    /// Discovered candidates, in directory-argument then file-name order
    pub images: Vec<ImageFile>,
    /// Errors that occurred during scanning (non-fatal)
    pub errors: Vec<ScanError>,
}
