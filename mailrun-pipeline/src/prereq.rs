//! Prerequisite check — fail fast before any network or filesystem mutation.

use mailrun_core::Journal;

use crate::error::PipelineError;
use crate::log_soft;
use crate::runner::print_status;

/// Executables every run needs, regardless of platform or flags.
pub const REQUIRED_TOOLS: [&str; 3] = ["notmuch", "mbsync", "afew"];

/// Consistency checker, only required when index maintenance will run.
pub const INTEGRITY_TOOL: &str = "xapian-check";

/// Verify all required tools exist on the search path.
///
/// Aborts the run with [`PipelineError::ToolMissing`] naming the first
/// missing tool. Runs before anything stateful.
pub fn check(journal: &Journal, with_integrity_tool: bool) -> Result<(), PipelineError> {
    let mut tools: Vec<&str> = REQUIRED_TOOLS.to_vec();
    if with_integrity_tool {
        tools.push(INTEGRITY_TOOL);
    }

    match check_tools(&tools) {
        Ok(()) => {
            print_status("check required tools", 0);
            log_soft(journal, "prereq", &format!("all present: {}", tools.join(", ")));
            Ok(())
        }
        Err(err) => {
            print_status("check required tools", 1);
            log_soft(journal, "prereq", &err.to_string());
            Err(err)
        }
    }
}

/// Look up each tool on the PATH, reporting the first one missing.
pub fn check_tools(tools: &[&str]) -> Result<(), PipelineError> {
    for tool in tools {
        which::which(tool).map_err(|_| PipelineError::ToolMissing {
            tool: tool.to_string(),
        })?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
