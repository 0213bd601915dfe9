//! Executor for consolidation plans.
//!
//! Groups run in parallel on the worker pool; the steps inside one group run
//! in order. A group's duplicates are only deleted after its survivor is
//! confirmed in the output directory, so an interrupted run never loses the
//! last copy of an image.

use super::types::*;
use crate::error::ConsolidateError;
use crate::events::{ConsolidateEvent, Event, EventSender};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, error, warn};

/// Executes consolidation plans
pub struct ConsolidateExecutor;

impl ConsolidateExecutor {
    /// Execute every group of `plan` on `pool`, collecting one outcome per group
    pub fn execute(
        plan: &ConsolidationPlan,
        pool: &ThreadPool,
        events: &EventSender,
    ) -> ConsolidationReport {
        let total = plan.groups.len();
        let completed = AtomicUsize::new(0);

        events.send(Event::Consolidate(ConsolidateEvent::Started {
            total_groups: total,
        }));

        let outcomes: Vec<GroupOutcome> = pool.install(|| {
            plan.groups
                .par_iter()
                .map(|group| {
                    let outcome = Self::execute_group(group, events);
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    events.send(Event::Consolidate(ConsolidateEvent::GroupFinished {
                        completed: done,
                        total,
                    }));
                    outcome
                })
                .collect()
        });

        let report = ConsolidationReport { outcomes };

        events.send(Event::Consolidate(ConsolidateEvent::Completed {
            moved: report.moved(),
            deleted: report.deleted(),
            errors: report.errors().count(),
        }));

        report
    }

    /// Place the survivor, then delete the duplicates
    pub fn execute_group(group: &GroupPlan, events: &EventSender) -> GroupOutcome {
        let mut outcome = GroupOutcome {
            group: group.group,
            placement: Placement::Aborted,
            deleted: Vec::new(),
            errors: Vec::new(),
        };

        let report = |outcome: &mut GroupOutcome, path: &Path, err: ConsolidateError| {
            events.send(Event::Consolidate(ConsolidateEvent::Error {
                path: path.to_path_buf(),
                message: err.to_string(),
            }));
            outcome.errors.push(err);
        };

        let Some(survivor) = group.survivor() else {
            let err = ConsolidateError::InvalidPlan(format!("group {} has no survivor", group.group));
            error!("{}", err);
            outcome.errors.push(err);
            return outcome;
        };
        let source = survivor.record.path.as_path();

        match &survivor.action {
            Action::MoveToOutput { destination } => match move_file(source, destination) {
                Ok(leftover) => {
                    debug!(from = %source.display(), to = %destination.display(), "moved survivor");
                    outcome.placement = Placement::Moved {
                        from: source.to_path_buf(),
                        to: destination.clone(),
                    };
                    // Survivor is in place; a leftover original is only a delete error
                    if let Some(err) = leftover {
                        warn!("{}", err);
                        report(&mut outcome, source, err);
                    }
                }
                Err(err) => {
                    error!("{}", err);
                    report(&mut outcome, source, err);
                    return outcome;
                }
            },
            _ => {
                if fs::symlink_metadata(source).is_err() {
                    let err = ConsolidateError::SurvivorMissing {
                        path: source.to_path_buf(),
                    };
                    error!("{}", err);
                    report(&mut outcome, source, err);
                    return outcome;
                }
                outcome.placement = Placement::KeptInPlace;
            }
        }

        for entry in group.deletions() {
            let path = &entry.record.path;
            match fs::remove_file(path) {
                Ok(()) => {
                    debug!(path = %path.display(), "removed duplicate");
                    outcome.deleted.push(path.clone());
                }
                Err(e) => {
                    let err = ConsolidateError::Delete {
                        path: path.clone(),
                        source: e,
                    };
                    warn!("{}", err);
                    report(&mut outcome, path, err);
                }
            }
        }

        outcome
    }
}

/// Hidden sibling used while copying, so the final name only ever holds a
/// complete file
fn partial_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    destination.with_file_name(format!(".{}.partial", name))
}

/// Move `source` to `destination` without ever overwriting.
///
/// Tries a rename first. When that fails (e.g. across filesystems) the file
/// is copied into place with [`copy_into_place`] and the original removed
/// afterwards. A failure to remove the original is returned as `Ok(Some(_))`:
/// the survivor is already safe at `destination`.
fn move_file(
    source: &Path,
    destination: &Path,
) -> Result<Option<ConsolidateError>, ConsolidateError> {
    move_file_with(source, destination, |from, to| fs::rename(from, to))
}

fn move_file_with<R>(
    source: &Path,
    destination: &Path,
    rename: R,
) -> Result<Option<ConsolidateError>, ConsolidateError>
where
    R: FnOnce(&Path, &Path) -> io::Result<()>,
{
    if fs::symlink_metadata(destination).is_ok() {
        return Err(ConsolidateError::DestinationExists {
            path: destination.to_path_buf(),
        });
    }

    if rename(source, destination).is_ok() {
        return Ok(None);
    }

    copy_into_place(source, destination)?;

    Ok(fs::remove_file(source)
        .err()
        .map(|e| ConsolidateError::Delete {
            path: source.to_path_buf(),
            source: e,
        }))
}

/// Copy `source` to `destination` through a hidden partial file.
///
/// The partial file is size-checked and synced before it is renamed to its
/// final name, so `destination` only ever holds a complete copy. An existing
/// `destination` is never overwritten. On failure the partial file is removed
/// and `source` is untouched.
fn copy_into_place(source: &Path, destination: &Path) -> Result<(), ConsolidateError> {
    let partial = partial_path(destination);
    let copied = (|| -> io::Result<()> {
        let expected = fs::metadata(source)?.len();
        let written = fs::copy(source, &partial)?;
        if written != expected {
            return Err(io::Error::other(format!(
                "copy verification failed: source {} bytes, copy {} bytes",
                expected, written
            )));
        }
        fs::File::open(&partial)?.sync_all()?;
        if fs::symlink_metadata(destination).is_ok() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "destination appeared during copy",
            ));
        }
        fs::rename(&partial, destination)
    })();

    copied.map_err(|e| {
        let _ = fs::remove_file(&partial);
        ConsolidateError::Copy {
            source_path: source.to_path_buf(),
            destination: destination.to_path_buf(),
            source: e,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::{ExactDigest, Signature};
    use crate::core::index::{GroupId, ImageRecord};
    use crate::events::null_sender;
    use rayon::ThreadPoolBuilder;
    use tempfile::TempDir;

    fn record(path: &Path) -> ImageRecord {
        ImageRecord {
            path: path.to_path_buf(),
            size: 4,
            source_index: 0,
            source_dir: path.parent().unwrap().to_path_buf(),
            signature: Signature::Exact(ExactDigest(1)),
        }
    }

    fn entry(path: &Path, action: Action) -> PlanEntry {
        PlanEntry {
            record: record(path),
            action,
        }
    }

    fn write(path: &Path, content: &[u8]) -> PathBuf {
        fs::write(path, content).unwrap();
        path.to_path_buf()
    }

    fn pool() -> ThreadPool {
        ThreadPoolBuilder::new().num_threads(2).build().unwrap()
    }

    #[test]
    fn move_then_delete_duplicates() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let survivor = write(&src.path().join("a.png"), b"data");
        let duplicate = write(&src.path().join("b.png"), b"data");
        let destination = out.path().join("a.png");

        let plan = ConsolidationPlan {
            output_dir: out.path().to_path_buf(),
            groups: vec![GroupPlan {
                group: GroupId(0),
                entries: vec![
                    entry(
                        &survivor,
                        Action::MoveToOutput {
                            destination: destination.clone(),
                        },
                    ),
                    entry(&duplicate, Action::Delete),
                ],
            }],
        };

        let report = ConsolidateExecutor::execute(&plan, &pool(), &null_sender());

        assert_eq!(report.moved(), 1);
        assert_eq!(report.deleted(), 1);
        assert_eq!(report.errors().count(), 0);
        assert!(!survivor.exists());
        assert!(!duplicate.exists());
        assert_eq!(fs::read(&destination).unwrap(), b"data");
    }

    #[test]
    fn failed_move_keeps_every_file() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let survivor = write(&src.path().join("a.png"), b"data");
        let duplicate = write(&src.path().join("b.png"), b"data");
        // Destination directory does not exist, so both rename and copy fail
        let destination = out.path().join("missing").join("a.png");

        let group = GroupPlan {
            group: GroupId(0),
            entries: vec![
                entry(&survivor, Action::MoveToOutput { destination }),
                entry(&duplicate, Action::Delete),
            ],
        };

        let outcome = ConsolidateExecutor::execute_group(&group, &null_sender());

        assert_eq!(outcome.placement, Placement::Aborted);
        assert!(outcome.deleted.is_empty());
        assert!(matches!(outcome.errors[0], ConsolidateError::Copy { .. }));
        assert!(survivor.exists());
        assert!(duplicate.exists());
    }

    #[test]
    fn existing_destination_is_never_overwritten() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let survivor = write(&src.path().join("a.png"), b"new");
        let destination = write(&out.path().join("a.png"), b"old");

        let group = GroupPlan {
            group: GroupId(0),
            entries: vec![entry(
                &survivor,
                Action::MoveToOutput {
                    destination: destination.clone(),
                },
            )],
        };

        let outcome = ConsolidateExecutor::execute_group(&group, &null_sender());

        assert!(matches!(
            outcome.errors[0],
            ConsolidateError::DestinationExists { .. }
        ));
        assert_eq!(fs::read(&destination).unwrap(), b"old");
        assert!(survivor.exists());
    }

    #[test]
    fn missing_survivor_protects_duplicates() {
        let out = TempDir::new().unwrap();
        let duplicate = write(&out.path().join("b.png"), b"data");

        let group = GroupPlan {
            group: GroupId(0),
            entries: vec![
                entry(&out.path().join("gone.png"), Action::KeepInPlace),
                entry(&duplicate, Action::Delete),
            ],
        };

        let outcome = ConsolidateExecutor::execute_group(&group, &null_sender());

        assert!(matches!(
            outcome.errors[0],
            ConsolidateError::SurvivorMissing { .. }
        ));
        assert!(duplicate.exists());
    }

    #[test]
    fn failed_delete_is_reported_not_fatal() {
        let out = TempDir::new().unwrap();
        let survivor = write(&out.path().join("a.png"), b"data");

        let group = GroupPlan {
            group: GroupId(0),
            entries: vec![
                entry(&survivor, Action::KeepInPlace),
                entry(&out.path().join("vanished.png"), Action::Delete),
            ],
        };

        let outcome = ConsolidateExecutor::execute_group(&group, &null_sender());

        assert_eq!(outcome.placement, Placement::KeptInPlace);
        assert_eq!(outcome.errors.len(), 1);
        assert!(!outcome.errors[0].aborts_group());
        assert!(survivor.exists());
    }

    fn cross_device(_: &Path, _: &Path) -> io::Result<()> {
        Err(io::Error::other("cross-device link"))
    }

    #[test]
    fn copy_fallback_places_file_and_removes_original() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let source = write(&src.path().join("a.png"), b"pixels");
        let destination = out.path().join("a.png");

        let leftover = move_file_with(&source, &destination, cross_device).unwrap();

        assert!(leftover.is_none());
        assert_eq!(fs::read(&destination).unwrap(), b"pixels");
        assert!(!source.exists());
        assert!(!partial_path(&destination).exists());
    }

    #[test]
    fn failed_copy_keeps_original_and_drops_partial() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let source = write(&src.path().join("a.png"), b"pixels");
        let destination = out.path().join("missing").join("a.png");

        let result = move_file_with(&source, &destination, cross_device);

        assert!(matches!(result, Err(ConsolidateError::Copy { .. })));
        assert_eq!(fs::read(&source).unwrap(), b"pixels");
        assert!(!partial_path(&destination).exists());
    }

    #[test]
    fn copy_never_replaces_a_destination_that_appeared() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let source = write(&src.path().join("a.png"), b"new");
        // Stands in for a file created while the copy ran
        let destination = write(&out.path().join("a.png"), b"old");

        let result = copy_into_place(&source, &destination);

        match result {
            Err(ConsolidateError::Copy { source: e, .. }) => {
                assert_eq!(e.kind(), io::ErrorKind::AlreadyExists)
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(fs::read(&destination).unwrap(), b"old");
        assert_eq!(fs::read(&source).unwrap(), b"new");
        assert!(!partial_path(&destination).exists());
    }

    #[test]
    fn partial_path_is_hidden_sibling() {
        assert_eq!(
            partial_path(Path::new("/out/a.png")),
            PathBuf::from("/out/.a.png.partial")
        );
    }
}
