//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the consolidation pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Scanning phase events
    Scan(ScanEvent),
    /// Signature phase events
    Hash(HashEvent),
    /// Grouping phase events
    Group(GroupEvent),
    /// Move/delete phase events
    Consolidate(ConsolidateEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events during the scanning phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { paths: Vec<PathBuf> },
    /// An image candidate was found
    ImageFound { path: PathBuf },
    /// An error occurred but scanning continues
    Error { path: PathBuf, message: String },
    /// Scanning completed
    Completed { total_images: usize },
}

/// Events during the signature phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HashEvent {
    /// Hashing has started
    Started { total_images: usize },
    /// Progress update during hashing
    Progress(HashProgress),
    /// A file could not be decoded; it is left untouched
    Error { path: PathBuf, message: String },
    /// Hashing completed
    Completed { total_hashed: usize, failed: usize },
}

/// Progress information during hashing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashProgress {
    /// Number of images hashed so far
    pub completed: usize,
    /// Total number of images to hash
    pub total: usize,
    /// Image that just finished
    pub current_path: PathBuf,
}

/// Events during grouping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GroupEvent {
    /// Grouping completed
    Completed {
        total_groups: usize,
        total_duplicates: usize,
    },
}

/// Events during consolidation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConsolidateEvent {
    /// Plan execution has started
    Started { total_groups: usize },
    /// One group has been fully processed
    GroupFinished { completed: usize, total: usize },
    /// A copy or delete failed
    Error { path: PathBuf, message: String },
    /// An emptied input directory was removed
    DirectoryRemoved { path: PathBuf },
    /// Plan execution completed
    Completed {
        moved: usize,
        deleted: usize,
        errors: usize,
    },
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed
    Completed { summary: RunSummary },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Scanning,
    Hashing,
    Grouping,
    Consolidating,
    Cleanup,
}

/// Per-stage counts reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Image candidates discovered by the scanner
    pub files_scanned: usize,
    /// Candidates that produced a signature
    pub files_hashed: usize,
    /// Candidates that failed decoding (left on disk)
    pub decode_errors: usize,
    /// Unreadable directories or entries
    pub scan_errors: usize,
    /// Number of groups (distinct images)
    pub groups: usize,
    /// Survivors moved into the output directory
    pub survivors_moved: usize,
    /// Survivors already inside the output directory
    pub survivors_in_place: usize,
    /// Duplicate files deleted
    pub duplicates_removed: usize,
    /// Groups whose survivor could not be placed
    pub copy_errors: usize,
    /// Files or directories that could not be removed
    pub delete_errors: usize,
    /// Emptied input directories removed
    pub directories_removed: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl RunSummary {
    /// Total per-file and per-group errors
    pub fn error_count(&self) -> usize {
        self.decode_errors + self.scan_errors + self.copy_errors + self.delete_errors
    }
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Scanning => write!(f, "Scanning"),
            PipelinePhase::Hashing => write!(f, "Hashing"),
            PipelinePhase::Grouping => write!(f, "Grouping"),
            PipelinePhase::Consolidating => write!(f, "Consolidating"),
            PipelinePhase::Cleanup => write!(f, "Removing empty directories"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Hash(HashEvent::Progress(HashProgress {
            completed: 10,
            total: 50,
            current_path: PathBuf::from("/photos/a.png"),
        }));

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Hash(HashEvent::Progress(p)) => {
                assert_eq!(p.completed, 10);
                assert_eq!(p.total, 50);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn summary_error_count_sums_all_kinds() {
        let summary = RunSummary {
            decode_errors: 1,
            scan_errors: 2,
            copy_errors: 3,
            delete_errors: 4,
            ..Default::default()
        };
        assert_eq!(summary.error_count(), 10);
    }

    #[test]
    fn phase_display() {
        assert_eq!(PipelinePhase::Hashing.to_string(), "Hashing");
        assert_eq!(PipelinePhase::Cleanup.to_string(), "Removing empty directories");
    }
}
