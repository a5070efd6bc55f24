//! The uniform step runner.
//!
//! Every unit of work in the pipeline goes through [`run_step`]: at-most-one
//! execution, combined stdout/stderr capture, one journal row, one padded
//! terminal status line. [`run_sequence`] layers the declared failure policy
//! on top — the runner never retries and imposes no timeouts of its own.

use std::process::Command;

use colored::Colorize;

use mailrun_core::{FailurePolicy, Journal, Step, StepAction, StepOutcome};

use crate::error::PipelineError;
use crate::log_soft;

/// Width the label is padded to before the status glyph.
const LABEL_WIDTH: usize = 36;

/// Execute one step and report its outcome.
///
/// Side effects: a `label \t exit N` journal row, a status line on stdout,
/// and — on failure — the full captured output journaled for diagnosis.
pub fn run_step(journal: &Journal, step: Step) -> StepOutcome {
    let Step { label, action, .. } = step;

    let (exit_code, output) = match action {
        StepAction::Command { program, args } => spawn(Command::new(program).args(&args)),
        StepAction::Shell(cmdline) => spawn(Command::new("sh").args(["-c", &cmdline])),
        StepAction::Func(body) => match body() {
            Ok(detail) => (0, detail),
            Err(detail) => (1, detail),
        },
    };

    print_status(&label, exit_code);
    log_soft(journal, &label, &format!("exit {exit_code}"));
    if exit_code != 0 {
        if let Err(err) = journal.append_block(&label, &output) {
            log::warn!("journal write failed ({label}): {err}");
        }
    }

    StepOutcome {
        label,
        exit_code,
        output,
    }
}

/// Execute an ordered sequence of steps under their failure policies.
///
/// `Abort` stops at the failing step; `Warn` prints and journals a warning
/// and continues; `Ignore` continues silently.
pub fn run_sequence(journal: &Journal, steps: Vec<Step>) -> Result<(), PipelineError> {
    for step in steps {
        let policy = step.policy;
        let outcome = run_step(journal, step);
        if outcome.success() {
            continue;
        }
        match policy {
            FailurePolicy::Abort => {
                return Err(PipelineError::StepFailed {
                    label: outcome.label,
                    code: outcome.exit_code,
                })
            }
            FailurePolicy::Warn => {
                eprintln!(
                    "{} '{}' failed (exit {}); continuing",
                    "warning:".yellow().bold(),
                    outcome.label,
                    outcome.exit_code,
                );
                log_soft(journal, &outcome.label, "continuing despite failure");
            }
            FailurePolicy::Ignore => {
                log::debug!("ignored failure in '{}'", outcome.label);
            }
        }
    }
    Ok(())
}

/// Execute a command step and return its stdout on success.
///
/// Used by phases that need the command's output (message counts, file
/// listings) rather than just its exit status.
pub fn capture_step(
    journal: &Journal,
    label: &str,
    program: &str,
    args: &[&str],
) -> Result<String, PipelineError> {
    let result = Command::new(program).args(args).output();
    let (exit_code, stdout, stderr) = match result {
        Ok(out) => (
            out.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&out.stdout).into_owned(),
            String::from_utf8_lossy(&out.stderr).into_owned(),
        ),
        Err(err) => (127, String::new(), err.to_string()),
    };

    print_status(label, exit_code);
    log_soft(journal, label, &format!("exit {exit_code}"));
    if exit_code != 0 {
        if let Err(err) = journal.append_block(label, &stderr) {
            log::warn!("journal write failed ({label}): {err}");
        }
        return Err(PipelineError::StepFailed {
            label: label.to_string(),
            code: exit_code,
        });
    }
    Ok(stdout)
}

fn spawn(command: &mut Command) -> (i32, String) {
    match command.output() {
        Ok(out) => {
            let mut combined = String::from_utf8_lossy(&out.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&out.stderr));
            // A signal death has no code; report it as -1.
            (out.status.code().unwrap_or(-1), combined)
        }
        // Spawn failure (program vanished between prereq check and now).
        Err(err) => (127, err.to_string()),
    }
}

/// One padded line per step: label, glyph, exit code on failure.
pub(crate) fn print_status(label: &str, exit_code: i32) {
    if exit_code == 0 {
        println!("{label:<LABEL_WIDTH$} {}", "✓".green().bold());
    } else {
        println!(
            "{label:<LABEL_WIDTH$} {} (exit {exit_code})",
            "✗".red().bold()
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
