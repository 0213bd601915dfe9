//! Removal of input directories emptied by consolidation.

use super::types::CleanupResult;
use crate::core::scanner::{is_hidden, ScanConfig};
use crate::error::ConsolidateError;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Remove empty directories under `root`, deepest first, including `root`
/// itself once it is empty.
///
/// Only directories the scanner walked are considered: the walk stops one
/// level above `config.max_depth` and skips hidden directories unless
/// `config.include_hidden` is set. The output directory and its ancestors are
/// never touched, nor is anything inside the output directory unless `root`
/// itself lies inside it. Non-empty directories are left alone.
pub fn remove_empty_dirs(root: &Path, output_dir: &Path, config: &ScanConfig) -> CleanupResult {
    let mut result = CleanupResult::default();
    let root_in_output = root.starts_with(output_dir) && root != output_dir;

    let mut walker = WalkDir::new(root).contents_first(true);
    if let Some(depth) = config.max_depth {
        walker = walker.max_depth(depth.saturating_sub(1));
    }

    let entries = walker.into_iter().filter_entry(|entry| {
        entry.depth() == 0 || config.include_hidden || !is_hidden(entry.path())
    });

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        if output_dir.starts_with(path) || (path.starts_with(output_dir) && !root_in_output) {
            continue;
        }

        let is_empty = fs::read_dir(path)
            .map(|mut children| children.next().is_none())
            .unwrap_or(false);
        if !is_empty {
            continue;
        }

        match fs::remove_dir(path) {
            Ok(()) => {
                debug!(directory = %path.display(), "removed empty directory");
                result.removed.push(path.to_path_buf());
            }
            Err(e) => {
                let err = ConsolidateError::Delete {
                    path: path.to_path_buf(),
                    source: e,
                };
                warn!("{}", err);
                result.errors.push(err);
            }
        }
    }

    result
}
