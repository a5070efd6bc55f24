//! Step descriptors — the unit of work the pipeline runner executes.
//!
//! Each step carries a human-readable label, an action, and a declared
//! failure policy. The runner loop in `mailrun-pipeline` is the only place
//! that interprets the policy; phases just build step tables.

use std::fmt;

// ---------------------------------------------------------------------------
// Failure policy
// ---------------------------------------------------------------------------

/// What a nonzero exit status means for the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the sequence immediately; the whole run fails.
    Abort,
    /// Print and journal a warning, then continue.
    Warn,
    /// Continue silently (best-effort cleanup steps).
    Ignore,
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Closure form of a step: native work run under the same policy loop.
/// `Ok(detail)` maps to exit 0, `Err(detail)` to exit 1.
pub type StepFn = Box<dyn FnOnce() -> Result<String, String> + Send>;

/// The executable body of a step.
pub enum StepAction {
    /// Spawn `program` with `args` directly, no shell involved.
    Command { program: String, args: Vec<String> },
    /// Run a full command line via `sh -c` (reachability probe only).
    Shell(String),
    /// Run native Rust work (file moves, pruning) as a step.
    Func(StepFn),
}

impl fmt::Debug for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepAction::Command { program, args } => f
                .debug_struct("Command")
                .field("program", program)
                .field("args", args)
                .finish(),
            StepAction::Shell(cmdline) => f.debug_tuple("Shell").field(cmdline).finish(),
            StepAction::Func(_) => f.write_str("Func(..)"),
        }
    }
}

// ---------------------------------------------------------------------------
// Step + outcome
// ---------------------------------------------------------------------------

/// A named unit of work with its failure policy.
#[derive(Debug)]
pub struct Step {
    pub label: String,
    pub action: StepAction,
    pub policy: FailurePolicy,
}

impl Step {
    /// A step that spawns an external program directly.
    pub fn command(
        label: impl Into<String>,
        program: impl Into<String>,
        args: &[&str],
        policy: FailurePolicy,
    ) -> Self {
        Step {
            label: label.into(),
            action: StepAction::Command {
                program: program.into(),
                args: args.iter().map(|a| a.to_string()).collect(),
            },
            policy,
        }
    }

    /// A step that runs a command line through `sh -c`.
    pub fn shell(label: impl Into<String>, cmdline: impl Into<String>, policy: FailurePolicy) -> Self {
        Step {
            label: label.into(),
            action: StepAction::Shell(cmdline.into()),
            policy,
        }
    }

    /// A step backed by native Rust work.
    pub fn func(
        label: impl Into<String>,
        policy: FailurePolicy,
        body: impl FnOnce() -> Result<String, String> + Send + 'static,
    ) -> Self {
        Step {
            label: label.into(),
            action: StepAction::Func(Box::new(body)),
            policy,
        }
    }
}

/// Result of executing one step: exit status plus combined captured output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub label: String,
    pub exit_code: i32,
    pub output: String,
}

impl StepOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
