//! # Selector Module
//!
//! Picks the one file of each group that is kept.
//!
//! ## Policy
//! Candidates are ranked by, in order:
//! 1. Already directly in the output directory (nothing has to move)
//! 2. Lowest source directory index (directory-argument order)
//! 3. Lexicographically smallest path
//!
//! The ranking is a total order over distinct paths, so the survivor depends
//! only on the group's contents, never on the order files arrived in.

use crate::core::index::{Group, GroupId, ImageRecord};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A group with its survivor chosen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedGroup {
    pub id: GroupId,
    /// The file that is kept
    pub survivor: ImageRecord,
    /// Files that are deleted once the survivor is safe, sorted by path
    pub duplicates: Vec<ImageRecord>,
}

/// Deterministic survivor selection
#[derive(Debug, Clone)]
pub struct SurvivorSelector {
    output_dir: PathBuf,
}

impl SurvivorSelector {
    /// `output_dir` should be canonical, like the scanned paths
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn rank<'a>(&self, record: &'a ImageRecord) -> (bool, usize, &'a Path) {
        (
            !record.is_inside(&self.output_dir),
            record.source_index,
            record.path.as_path(),
        )
    }

    /// The survivor of a group, or None for an empty group
    pub fn select<'a>(&self, group: &'a Group) -> Option<&'a ImageRecord> {
        group.members.iter().min_by(|a, b| self.rank(a).cmp(&self.rank(b)))
    }

    /// Split a group into its survivor and the files to delete
    pub fn resolve(&self, group: Group) -> Option<ResolvedGroup> {
        let mut members = group.members;
        members.sort_by(|a, b| self.rank(a).cmp(&self.rank(b)));

        let mut members = members.into_iter();
        let survivor = members.next()?;
        let mut duplicates: Vec<_> = members.collect();
        duplicates.sort_by(|a, b| a.path.cmp(&b.path));

        Some(ResolvedGroup {
            id: group.id,
            survivor,
            duplicates,
        })
    }
}
