//! mailrun — sequential mail sync orchestrator.
//!
//! Drives notmuch, mbsync, and afew through a fixed pipeline: check tools,
//! probe reachability, verify and back up the index, sync, retag, and report
//! the inbox delta.
//!
//! # Usage
//!
//! ```text
//! mailrun              # full sync cycle
//! mailrun -d           # …then archive deleted mail and expunge the remote
//! mailrun -m           # …then apply folder moves and push them
//! ```
//!
//! Exit codes: 0 success (including "No new mail"), 1 fatal step failure or
//! bad usage, 2 missing backup/trash directory.

use std::process;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use colored::Colorize;

use mailrun_core::Config;
use mailrun_pipeline::{maintenance, PipelineError, RunOptions};

#[derive(Parser, Debug)]
#[command(
    name = "mailrun",
    version,
    about = "Synchronize, index, and tag mail in one sequential run",
    long_about = None,
)]
struct Cli {
    /// Apply the tagging engine's folder moves and push them to the remote.
    #[arg(short = 'm', long = "move")]
    move_mail: bool,

    /// Archive mail tagged deleted locally and expunge it from the remote.
    #[arg(short = 'd', long = "delete")]
    delete: bool,
}

fn main() {
    env_logger::init();

    // The run contract wants exit 1 for bad usage, not clap's default 2.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = err.print();
            process::exit(code);
        }
    };

    process::exit(run(cli));
}

fn run(cli: Cli) -> i32 {
    let cfg = match Config::from_env().context("failed to build configuration") {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            return 1;
        }
    };

    let notifier = mailrun_notify::best_available();
    let opts = RunOptions {
        archive_deleted: cli.delete,
        move_mail: cli.move_mail,
    };

    match mailrun_pipeline::run(&cfg, notifier.as_ref(), opts) {
        Ok(()) => 0,
        Err(err) => {
            // Corruption gets the restore runbook, not just a one-liner.
            if matches!(err, PipelineError::IndexCorrupt { .. }) {
                eprintln!("{}", maintenance::recovery_runbook(&cfg));
            }
            eprintln!("{} {err}", "error:".red().bold());
            notifier.notify("mailrun failed", &err.to_string());
            err.exit_code()
        }
    }
}
