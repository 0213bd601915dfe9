//! Types for the consolidate module.

use crate::core::index::{GroupId, ImageRecord};
use crate::error::ConsolidateError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// What happens to one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Survivor already inside the output directory
    KeepInPlace,
    /// Survivor moved to `destination` inside the output directory
    MoveToOutput { destination: PathBuf },
    /// Duplicate removed once the survivor is in place
    Delete,
}

/// One file and its action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEntry {
    pub record: ImageRecord,
    pub action: Action,
}

/// The actions for one group. The survivor entry comes first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupPlan {
    pub group: GroupId,
    pub entries: Vec<PlanEntry>,
}

impl GroupPlan {
    /// The non-delete entry
    pub fn survivor(&self) -> Option<&PlanEntry> {
        self.entries.iter().find(|e| e.action != Action::Delete)
    }

    /// Entries to delete after the survivor is placed
    pub fn deletions(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries.iter().filter(|e| e.action == Action::Delete)
    }
}

/// Ordered list of actions for the whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationPlan {
    pub output_dir: PathBuf,
    pub groups: Vec<GroupPlan>,
}

impl ConsolidationPlan {
    /// Every entry, group by group
    pub fn entries(&self) -> impl Iterator<Item = &PlanEntry> {
        self.groups.iter().flat_map(|g| g.entries.iter())
    }

    /// Number of survivors that will move
    pub fn move_count(&self) -> usize {
        self.entries()
            .filter(|e| matches!(e.action, Action::MoveToOutput { .. }))
            .count()
    }

    /// Number of files that will be deleted
    pub fn delete_count(&self) -> usize {
        self.entries().filter(|e| e.action == Action::Delete).count()
    }

    /// Check the plan invariants: each source appears once, each group has
    /// exactly one non-delete entry, every destination is unique and inside
    /// the output directory.
    pub fn validate(&self) -> Result<(), ConsolidateError> {
        let mut sources: HashSet<&Path> = HashSet::new();
        let mut destinations: HashSet<&Path> = HashSet::new();

        for group in &self.groups {
            let kept = group
                .entries
                .iter()
                .filter(|e| e.action != Action::Delete)
                .count();
            if kept != 1 {
                return Err(ConsolidateError::InvalidPlan(format!(
                    "group {} keeps {} files",
                    group.group, kept
                )));
            }

            for entry in &group.entries {
                if !sources.insert(entry.record.path.as_path()) {
                    return Err(ConsolidateError::InvalidPlan(format!(
                        "{} is planned twice",
                        entry.record.path.display()
                    )));
                }
                if let Action::MoveToOutput { destination } = &entry.action {
                    if destination.parent() != Some(self.output_dir.as_path())
                        || !destinations.insert(destination.as_path())
                    {
                        return Err(ConsolidateError::InvalidPlan(format!(
                            "bad destination {}",
                            destination.display()
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Where a group's survivor ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Already in the output directory
    KeptInPlace,
    /// Moved from `from` to `to`
    Moved { from: PathBuf, to: PathBuf },
    /// Survivor could not be placed; every file of the group is untouched
    Aborted,
}

/// Result of executing one group
#[derive(Debug)]
pub struct GroupOutcome {
    pub group: GroupId,
    pub placement: Placement,
    /// Duplicates actually removed
    pub deleted: Vec<PathBuf>,
    pub errors: Vec<ConsolidateError>,
}

/// Result of executing a whole plan
#[derive(Debug, Default)]
pub struct ConsolidationReport {
    pub outcomes: Vec<GroupOutcome>,
}

impl ConsolidationReport {
    pub fn moved(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.placement, Placement::Moved { .. }))
            .count()
    }

    pub fn kept_in_place(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.placement == Placement::KeptInPlace)
            .count()
    }

    pub fn deleted(&self) -> usize {
        self.outcomes.iter().map(|o| o.deleted.len()).sum()
    }

    /// Groups whose survivor could not be placed
    pub fn copy_errors(&self) -> usize {
        self.errors().filter(|e| e.aborts_group()).count()
    }

    /// Deletes that failed
    pub fn delete_errors(&self) -> usize {
        self.errors().filter(|e| !e.aborts_group()).count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ConsolidateError> {
        self.outcomes.iter().flat_map(|o| o.errors.iter())
    }
}

/// Result of removing emptied directories
#[derive(Debug, Default)]
pub struct CleanupResult {
    pub removed: Vec<PathBuf>,
    pub errors: Vec<ConsolidateError>,
}
