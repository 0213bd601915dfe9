//! # CLI Module
//!
//! Command-line interface for the image consolidator.
//!
//! ## Usage
//! ```bash
//! # Merge ~/Downloads and ~/Desktop into ~/Pictures
//! dedup-images ~/Pictures ~/Downloads ~/Desktop
//!
//! # Merge everything into a new directory
//! dedup-images ~/Pictures ~/Backup -o ~/Merged
//!
//! # Group near-identical images, not just exact pixel matches
//! dedup-images ~/Pictures ~/Backup --mode similar --threshold 6
//!
//! # Show what would happen
//! dedup-images ~/Pictures ~/Backup --dry-run
//! ```

use clap::{Parser, ValueEnum};
use console::{style, Term};
use image_consolidator::core::consolidate::{Action, ConsolidationPlan};
use image_consolidator::core::hasher::{DedupMode, DEFAULT_HASH_SIZE, DEFAULT_THRESHOLD};
use image_consolidator::core::pipeline::{Pipeline, PipelineResult, DEFAULT_JOBS};
use image_consolidator::events::{
    ConsolidateEvent, Event, EventChannel, EventReceiver, HashEvent, PipelineEvent,
};
use image_consolidator::init_tracing;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

/// Consolidate duplicate images from several directories into one
#[derive(Parser, Debug)]
#[command(name = "dedup-images")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Main directory; survivors are collected here unless --output is given
    main_directory: PathBuf,

    /// Directories to merge into the main directory
    #[arg(required = true)]
    directories: Vec<PathBuf>,

    /// Alternate output directory (created if missing)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of worker threads
    #[arg(short, long, default_value_t = DEFAULT_JOBS)]
    jobs: usize,

    /// 0 = silent, 1 = summary and errors, up to 5 = trace
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=5))]
    verbosity: u8,

    /// How images are considered duplicates
    #[arg(short, long, value_enum, default_value_t = Mode::Exact)]
    mode: Mode,

    /// Maximum hash distance in similar mode (lower = stricter)
    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: u32,

    /// Perceptual hash edge length in similar mode (4-64)
    #[arg(long, default_value_t = DEFAULT_HASH_SIZE)]
    hash_size: u32,

    /// Print the plan without moving or deleting anything
    #[arg(short = 'n', long)]
    dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Identical decoded pixels, regardless of file format
    Exact,
    /// Perceptual hashes within --threshold bits
    Similar,
}

impl Cli {
    fn dedup_mode(&self) -> DedupMode {
        match self.mode {
            Mode::Exact => DedupMode::Exact,
            Mode::Similar => DedupMode::Similar {
                threshold: self.threshold,
            },
        }
    }
}

/// Run the CLI
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbosity);

    let term = Term::stderr();

    let pipeline = match Pipeline::builder()
        .main_directory(&cli.main_directory)
        .directories(cli.directories.clone())
        .output(cli.output.clone())
        .jobs(cli.jobs)
        .mode(cli.dedup_mode())
        .hash_size(cli.hash_size)
        .dry_run(cli.dry_run)
        .build()
    {
        Ok(pipeline) => pipeline,
        Err(e) => {
            term.write_line(&format!("{} {}", style("error:").red().bold(), e))
                .ok();
            return ExitCode::from(1);
        }
    };

    if cli.verbosity >= 1 {
        term.write_line(&format!(
            "{} {}",
            style("Image Consolidator").bold().cyan(),
            style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line(&format!(
            "  output: {}  mode: {}  jobs: {}",
            style(pipeline.output_dir().display()).cyan(),
            cli.dedup_mode(),
            cli.jobs
        ))
        .ok();
    }

    let (sender, receiver) = EventChannel::new();
    let progress = if cli.verbosity >= 1 {
        Some(progress_bar())
    } else {
        None
    };
    let event_thread = {
        let progress = progress.clone();
        thread::spawn(move || render_events(receiver, progress))
    };

    let result = pipeline.run_with_events(&sender);

    // Dropping the sender ends the event loop
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    match result {
        Ok(result) => {
            if cli.dry_run {
                print_plan(&result.plan);
            }
            if cli.verbosity >= 1 {
                print_summary(&term, &result, cli.dry_run);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            term.write_line(&format!("{} {}", style("error:").red().bold(), e))
                .ok();
            ExitCode::from(1)
        }
    }
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    pb
}

fn render_events(receiver: EventReceiver, progress: Option<ProgressBar>) {
    for event in receiver.iter() {
        let Some(ref pb) = progress else {
            continue;
        };
        match event {
            Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                pb.set_message(phase.to_string());
            }
            Event::Hash(HashEvent::Started { total_images }) => {
                pb.set_length(total_images as u64);
                pb.set_position(0);
            }
            Event::Hash(HashEvent::Progress(p)) => {
                pb.set_position(p.completed as u64);
            }
            Event::Consolidate(ConsolidateEvent::Started { total_groups }) => {
                pb.set_length(total_groups as u64);
                pb.set_position(0);
            }
            Event::Consolidate(ConsolidateEvent::GroupFinished { completed, .. }) => {
                pb.set_position(completed as u64);
            }
            Event::Pipeline(PipelineEvent::Completed { .. }) => {
                pb.finish_and_clear();
            }
            _ => {}
        }
    }
}

fn print_plan(plan: &ConsolidationPlan) {
    for group in &plan.groups {
        for entry in &group.entries {
            let path = entry.record.path.display();
            match &entry.action {
                Action::KeepInPlace => println!("keep   {}", path),
                Action::MoveToOutput { destination } => {
                    println!("move   {} -> {}", path, destination.display())
                }
                Action::Delete => println!("delete {}", path),
            }
        }
    }
}

fn print_summary(term: &Term, result: &PipelineResult, dry_run: bool) {
    let summary = &result.summary;

    term.write_line("").ok();
    let heading = if dry_run { "Plan Complete" } else { "Consolidation Complete" };
    term.write_line(&format!("{} {}", style("✓").green().bold(), heading))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} images scanned in {:.1}s",
        style(summary.files_scanned).cyan(),
        summary.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} distinct images",
        style(summary.groups).cyan()
    ))
    .ok();

    if dry_run {
        term.write_line(&format!(
            "  {} would move, {} would be deleted",
            style(result.plan.move_count()).cyan(),
            style(result.plan.delete_count()).yellow()
        ))
        .ok();
    } else {
        term.write_line(&format!(
            "  {} moved, {} already in place",
            style(summary.survivors_moved).cyan(),
            style(summary.survivors_in_place).dim()
        ))
        .ok();
        term.write_line(&format!(
            "  {} duplicates removed",
            style(summary.duplicates_removed).yellow()
        ))
        .ok();
        if summary.directories_removed > 0 {
            term.write_line(&format!(
                "  {} empty directories removed",
                style(summary.directories_removed).dim()
            ))
            .ok();
        }
    }

    let error_count = summary.error_count();
    if error_count > 0 {
        term.write_line("").ok();
        term.write_line(&format!(
            "{} {} errors (files involved were left in place)",
            style("!").red().bold(),
            style(error_count).red()
        ))
        .ok();
        for error in &result.errors {
            term.write_line(&format!("  {}", style(error).dim())).ok();
        }
    }
}
