//! Plan generator: turns resolved groups into file actions.

use super::types::*;
use crate::core::selector::ResolvedGroup;
use std::collections::{HashMap, HashSet};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Builds consolidation plans
pub struct ConsolidationPlanner;

impl ConsolidationPlanner {
    /// Create the plan for `groups`, reserving a unique destination for every
    /// survivor that has to move into `output_dir`.
    ///
    /// Destinations never collide with a file already on disk or with another
    /// planned destination; clashes get a `_1`, `_2`, ... suffix.
    pub fn create_plan(groups: Vec<ResolvedGroup>, output_dir: &Path) -> ConsolidationPlan {
        let mut reserved: HashSet<PathBuf> = HashSet::new();
        // Next suffix to try for each clashing file name
        let mut counters: HashMap<PathBuf, usize> = HashMap::new();

        let groups = groups
            .into_iter()
            .map(|group| {
                let action = if group.survivor.is_inside(output_dir) {
                    Action::KeepInPlace
                } else {
                    let destination = Self::reserve_destination(
                        output_dir,
                        &group.survivor.path,
                        &mut reserved,
                        &mut counters,
                    );
                    debug!(
                        from = %group.survivor.path.display(),
                        to = %destination.display(),
                        "planned move"
                    );
                    Action::MoveToOutput { destination }
                };

                let mut entries = Vec::with_capacity(group.duplicates.len() + 1);
                entries.push(PlanEntry {
                    record: group.survivor,
                    action,
                });
                entries.extend(group.duplicates.into_iter().map(|record| PlanEntry {
                    record,
                    action: Action::Delete,
                }));

                GroupPlan {
                    group: group.id,
                    entries,
                }
            })
            .collect();

        ConsolidationPlan {
            output_dir: output_dir.to_path_buf(),
            groups,
        }
    }

    fn reserve_destination(
        output_dir: &Path,
        source: &Path,
        reserved: &mut HashSet<PathBuf>,
        counters: &mut HashMap<PathBuf, usize>,
    ) -> PathBuf {
        let file_name = source.file_name().unwrap_or(OsStr::new("image"));
        let base = output_dir.join(file_name);

        if Self::is_free(&base, reserved) {
            reserved.insert(base.clone());
            return base;
        }

        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image")
            .to_string();
        let extension = source.extension().and_then(|e| e.to_str());

        let counter = counters.entry(base).or_insert(1);
        loop {
            let name = match extension {
                Some(ext) => format!("{}_{}.{}", stem, counter, ext),
                None => format!("{}_{}", stem, counter),
            };
            *counter += 1;

            let candidate = output_dir.join(name);
            if Self::is_free(&candidate, reserved) {
                reserved.insert(candidate.clone());
                return candidate;
            }
        }
    }

    fn is_free(candidate: &Path, reserved: &HashSet<PathBuf>) -> bool {
        !reserved.contains(candidate) && fs::symlink_metadata(candidate).is_err()
    }
}
