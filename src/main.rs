//! # dedup-images CLI
//!
//! Consolidates duplicate images from several directories into one.
//!
//! ## Usage
//! ```bash
//! dedup-images ~/Pictures ~/Downloads ~/Desktop
//! dedup-images ~/Pictures ~/Backup -o ~/Merged --mode similar -j 4
//! ```

mod cli;

use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}
