//! Pipeline execution implementation.

use crate::core::consolidate::{
    remove_empty_dirs, ConsolidateExecutor, ConsolidationPlan, ConsolidationPlanner,
    ConsolidationReport,
};
use crate::core::hasher::{DedupMode, HasherConfig, SignatureProvider, DEFAULT_HASH_SIZE};
use crate::core::index::{DedupIndex, ImageRecord};
use crate::core::scanner::{ImageFile, ScanConfig, WalkDirScanner};
use crate::core::selector::SurvivorSelector;
use crate::error::{ConfigError, ConsolidatorError, HashError};
use crate::events::{
    null_sender, ConsolidateEvent, Event, EventSender, GroupEvent, HashEvent, HashProgress,
    PipelineEvent, PipelinePhase, RunSummary,
};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default worker pool size
pub const DEFAULT_JOBS: usize = 8;

/// Result of pipeline execution
#[derive(Debug)]
pub struct PipelineResult {
    /// Per-stage counts
    pub summary: RunSummary,
    /// The plan that was (or, in a dry run, would have been) executed
    pub plan: ConsolidationPlan,
    /// Per-group outcomes; empty for a dry run
    pub report: ConsolidationReport,
    /// Every non-fatal error, formatted for display
    pub errors: Vec<String>,
}

/// Configuration for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Main directory; also the output directory unless one is given
    pub main_directory: PathBuf,
    /// Directories to compare against the main directory
    pub directories: Vec<PathBuf>,
    /// Alternate output directory
    pub output: Option<PathBuf>,
    /// Worker pool size
    pub jobs: usize,
    /// Exact or similar grouping
    pub mode: DedupMode,
    /// Perceptual hash edge length
    pub hash_size: u32,
    /// Scanner configuration
    pub scan_config: ScanConfig,
    /// Plan only; touch nothing
    pub dry_run: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            main_directory: PathBuf::new(),
            directories: Vec::new(),
            output: None,
            jobs: DEFAULT_JOBS,
            mode: DedupMode::Exact,
            hash_size: DEFAULT_HASH_SIZE,
            scan_config: ScanConfig::default(),
            dry_run: false,
        }
    }
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: PipelineConfig,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    /// Set the main directory
    pub fn main_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.main_directory = path.into();
        self
    }

    /// Set the directories to compare
    pub fn directories(mut self, paths: Vec<PathBuf>) -> Self {
        self.config.directories = paths;
        self
    }

    /// Set an output directory other than the main directory
    pub fn output(mut self, path: Option<PathBuf>) -> Self {
        self.config.output = path;
        self
    }

    /// Set the worker pool size
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.config.jobs = jobs;
        self
    }

    /// Set the dedup mode
    pub fn mode(mut self, mode: DedupMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set the perceptual hash edge length
    pub fn hash_size(mut self, size: u32) -> Self {
        self.config.hash_size = size;
        self
    }

    /// Set scanner configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.config.scan_config = config;
        self
    }

    /// Plan without moving or deleting anything
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    /// Validate the configuration and prepare the run.
    ///
    /// Creating a missing output directory is the only filesystem change made
    /// here, and it happens after every other check has passed.
    pub fn build(self) -> Result<Pipeline, ConfigError> {
        let config = self.config;

        if config.directories.is_empty() {
            return Err(ConfigError::NoDirectories);
        }
        if config.jobs == 0 {
            return Err(ConfigError::ZeroJobs);
        }

        let inputs: Vec<&PathBuf> = std::iter::once(&config.main_directory)
            .chain(config.directories.iter())
            .collect();
        for path in &inputs {
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory {
                    path: path.to_path_buf(),
                });
            }
        }

        let provider = HasherConfig::new()
            .mode(config.mode)
            .hash_size(config.hash_size)
            .build()?;

        let pool = ThreadPoolBuilder::new()
            .num_threads(config.jobs)
            .thread_name(|i| format!("consolidate-{}", i))
            .build()
            .map_err(|e| ConfigError::ThreadPool(e.to_string()))?;

        let output = config
            .output
            .clone()
            .unwrap_or_else(|| config.main_directory.clone());
        if !output.exists() {
            debug!(directory = %output.display(), "creating output directory");
            fs::create_dir_all(&output).map_err(|e| ConfigError::CreateOutput {
                path: output.clone(),
                source: e,
            })?;
        } else if !output.is_dir() {
            return Err(ConfigError::NotADirectory { path: output });
        }

        let output_dir = canonical(&output)?;
        let mut roots = vec![output_dir.clone()];
        for path in inputs {
            let path = canonical(path)?;
            if !roots.contains(&path) {
                roots.push(path);
            }
        }

        Ok(Pipeline {
            scanner: WalkDirScanner::new(config.scan_config.clone()),
            config,
            roots,
            output_dir,
            provider,
            pool,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn canonical(path: &Path) -> Result<PathBuf, ConfigError> {
    path.canonicalize().map_err(|e| ConfigError::Canonicalize {
        path: path.to_path_buf(),
        source: e,
    })
}

/// The consolidation pipeline
pub struct Pipeline {
    config: PipelineConfig,
    /// Output directory first, then main and compare directories, canonical
    roots: Vec<PathBuf>,
    output_dir: PathBuf,
    scanner: WalkDirScanner,
    provider: Box<dyn SignatureProvider>,
    pool: ThreadPool,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Directories in survivor-preference order
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// The canonical output directory
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run the pipeline without events
    pub fn run(&self) -> Result<PipelineResult, ConsolidatorError> {
        self.run_with_events(&null_sender())
    }

    /// Run the pipeline with event reporting.
    ///
    /// Per-file and per-group failures are collected in the result; an error
    /// is only returned if grouping breaks an invariant, before any file is
    /// touched.
    pub fn run_with_events(
        &self,
        events: &EventSender,
    ) -> Result<PipelineResult, ConsolidatorError> {
        let start_time = Instant::now();
        let mut summary = RunSummary::default();
        let mut errors = Vec::new();

        events.send(Event::Pipeline(PipelineEvent::Started));

        // Phase 1: Scanning
        self.enter(events, PipelinePhase::Scanning);
        let scan = self.scanner.scan(&self.roots, events);
        summary.files_scanned = scan.images.len();
        summary.scan_errors = scan.errors.len();
        errors.extend(scan.errors.iter().map(|e| e.to_string()));
        info!(images = summary.files_scanned, "scan complete");

        // Phase 2: Hashing
        self.enter(events, PipelinePhase::Hashing);
        let (records, failures) = self.hash_all(scan.images, events);
        summary.files_hashed = records.len();
        summary.decode_errors = failures.len();
        errors.extend(failures.iter().map(|e| e.to_string()));

        // Phase 3: Grouping, serialized in scan order
        self.enter(events, PipelinePhase::Grouping);
        let mut index = DedupIndex::new(self.config.mode);
        for record in records {
            index.insert(record)?;
        }
        let groups = index.into_groups();
        let duplicates: usize = groups.iter().map(|g| g.duplicate_count()).sum();
        summary.groups = groups.len();
        events.send(Event::Group(GroupEvent::Completed {
            total_groups: groups.len(),
            total_duplicates: duplicates,
        }));
        info!(groups = groups.len(), duplicates, mode = %self.config.mode, "grouping complete");

        // Phase 4: Survivors and plan
        let selector = SurvivorSelector::new(&self.output_dir);
        let resolved = groups
            .into_iter()
            .filter_map(|group| selector.resolve(group))
            .collect();
        let plan = ConsolidationPlanner::create_plan(resolved, &self.output_dir);
        plan.validate()?;

        if self.config.dry_run {
            info!(
                moves = plan.move_count(),
                deletes = plan.delete_count(),
                "dry run, nothing changed"
            );
            summary.duration_ms = start_time.elapsed().as_millis() as u64;
            events.send(Event::Pipeline(PipelineEvent::Completed {
                summary: summary.clone(),
            }));
            return Ok(PipelineResult {
                summary,
                plan,
                report: ConsolidationReport::default(),
                errors,
            });
        }

        // Phase 5: Consolidation
        self.enter(events, PipelinePhase::Consolidating);
        let report = ConsolidateExecutor::execute(&plan, &self.pool, events);
        summary.survivors_moved = report.moved();
        summary.survivors_in_place = report.kept_in_place();
        summary.duplicates_removed = report.deleted();
        summary.copy_errors = report.copy_errors();
        summary.delete_errors = report.delete_errors();
        errors.extend(report.errors().map(|e| e.to_string()));

        // Phase 6: Cleanup
        self.enter(events, PipelinePhase::Cleanup);
        for root in self.roots.iter().filter(|r| **r != self.output_dir) {
            let cleanup = remove_empty_dirs(root, &self.output_dir, &self.config.scan_config);
            for path in &cleanup.removed {
                events.send(Event::Consolidate(ConsolidateEvent::DirectoryRemoved {
                    path: path.clone(),
                }));
            }
            summary.directories_removed += cleanup.removed.len();
            summary.delete_errors += cleanup.errors.len();
            errors.extend(cleanup.errors.iter().map(|e| e.to_string()));
        }

        summary.duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            moved = summary.survivors_moved,
            removed = summary.duplicates_removed,
            errors = summary.error_count(),
            elapsed_ms = summary.duration_ms,
            "done"
        );

        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: summary.clone(),
        }));

        Ok(PipelineResult {
            summary,
            plan,
            report,
            errors,
        })
    }

    fn enter(&self, events: &EventSender, phase: PipelinePhase) {
        debug!(%phase, "entering phase");
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged { phase }));
    }

    /// Compute signatures on the pool. Records come back in scan order.
    fn hash_all(
        &self,
        images: Vec<ImageFile>,
        events: &EventSender,
    ) -> (Vec<ImageRecord>, Vec<HashError>) {
        let total = images.len();
        let completed = AtomicUsize::new(0);

        events.send(Event::Hash(HashEvent::Started {
            total_images: total,
        }));

        let results: Vec<Result<ImageRecord, HashError>> = self.pool.install(|| {
            images
                .into_par_iter()
                .map(|file| {
                    let signature = self.provider.compute(&file.path);
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    events.send(Event::Hash(HashEvent::Progress(HashProgress {
                        completed: done,
                        total,
                        current_path: file.path.clone(),
                    })));

                    match signature {
                        Ok(signature) => {
                            debug!(
                                path = %file.path.display(),
                                signature = %signature.to_hex(),
                                "hashed"
                            );
                            Ok(ImageRecord::new(file, signature))
                        }
                        Err(e) => {
                            warn!("{}", e);
                            events.send(Event::Hash(HashEvent::Error {
                                path: file.path.clone(),
                                message: e.to_string(),
                            }));
                            Err(e)
                        }
                    }
                })
                .collect()
        });

        let mut records = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(record) => records.push(record),
                Err(e) => failures.push(e),
            }
        }

        events.send(Event::Hash(HashEvent::Completed {
            total_hashed: records.len(),
            failed: failures.len(),
        }));

        (records, failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn build_requires_compare_directories() {
        let temp_dir = TempDir::new().unwrap();
        let result = Pipeline::builder()
            .main_directory(temp_dir.path())
            .build();

        assert!(matches!(result, Err(ConfigError::NoDirectories)));
    }

    #[test]
    fn build_rejects_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = Pipeline::builder()
            .main_directory(temp_dir.path())
            .directories(vec![PathBuf::from("/nonexistent/path/12345")])
            .build();

        assert!(matches!(result, Err(ConfigError::NotADirectory { .. })));
    }

    #[test]
    fn build_rejects_zero_jobs() {
        let temp_dir = TempDir::new().unwrap();
        let result = Pipeline::builder()
            .main_directory(temp_dir.path())
            .directories(vec![temp_dir.path().to_path_buf()])
            .jobs(0)
            .build();

        assert!(matches!(result, Err(ConfigError::ZeroJobs)));
    }

    #[test]
    fn failed_validation_creates_no_output() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("new-out");
        let result = Pipeline::builder()
            .main_directory(temp_dir.path())
            .directories(vec![temp_dir.path().join("missing")])
            .output(Some(output.clone()))
            .build();

        assert!(result.is_err());
        assert!(!output.exists());
    }

    #[test]
    fn roots_put_output_first_and_drop_repeats() {
        let temp_dir = TempDir::new().unwrap();
        let main = temp_dir.path().join("main");
        let other = temp_dir.path().join("other");
        fs::create_dir(&main).unwrap();
        fs::create_dir(&other).unwrap();

        let pipeline = Pipeline::builder()
            .main_directory(&main)
            .directories(vec![other.clone(), main.clone(), other.clone()])
            .output(Some(temp_dir.path().join("out")))
            .build()
            .unwrap();

        let roots = pipeline.roots();
        assert_eq!(roots.len(), 3);
        assert_eq!(roots[0], pipeline.output_dir());
        assert_eq!(roots[1], main.canonicalize().unwrap());
        assert_eq!(roots[2], other.canonicalize().unwrap());
    }

    #[test]
    fn empty_directories_produce_empty_run() {
        let temp_dir = TempDir::new().unwrap();
        let main = temp_dir.path().join("main");
        let other = temp_dir.path().join("other");
        fs::create_dir(&main).unwrap();
        fs::create_dir(&other).unwrap();

        let result = Pipeline::builder()
            .main_directory(&main)
            .directories(vec![other.clone()])
            .build()
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(result.summary.files_scanned, 0);
        assert_eq!(result.summary.groups, 0);
        assert_eq!(result.summary.directories_removed, 1);
        assert!(main.exists());
        assert!(!other.exists());
    }
}
