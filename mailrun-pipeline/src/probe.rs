//! Reachability probe — abort before any stateful step when offline.
//!
//! Syncing against the local index while genuinely offline can make the
//! tagging and sync steps diverge, so an unreachable mail host is fatal.
//! The probe command carries its own timeout (`nc -w 5 …`); the runner
//! imposes none.

use mailrun_core::{Config, FailurePolicy, Journal, Step};

use crate::error::PipelineError;
use crate::log_soft;
use crate::runner::run_step;

/// Run the configured probe, if any. An unset probe counts as reachable.
pub fn check(journal: &Journal, cfg: &Config) -> Result<(), PipelineError> {
    let Some(probe) = cfg.probe.as_deref() else {
        log_soft(journal, "reachability", "no probe configured, skipped");
        println!("check mail host — no probe configured, skipped");
        return Ok(());
    };

    let outcome = run_step(
        journal,
        Step::shell("check mail host", probe, FailurePolicy::Abort),
    );
    if outcome.success() {
        Ok(())
    } else {
        Err(PipelineError::Unreachable {
            probe: probe.to_string(),
            code: outcome.exit_code,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
