//! Mailrun pipeline — the step runner and every phase of the sync workflow.
//!
//! Phases, in run order:
//! [`prereq`] → [`probe`] → [`maintenance`] (compact, integrity check,
//! backup, retention) → [`cycle`] (index / tag / sync / tag) →
//! [`archival`] (flag-gated) → [`report`].
//!
//! [`run`] is the canonical entrypoint used by the `mailrun` binary.

pub mod archival;
pub mod cycle;
pub mod error;
pub mod maintenance;
pub mod prereq;
pub mod probe;
pub mod report;
pub mod runner;

pub use error::PipelineError;

use mailrun_core::{Config, Journal};
use mailrun_notify::Notifier;

/// Flag-gated phases requested on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// `-d/--delete`: archive deleted mail and expunge it from the remote.
    pub archive_deleted: bool,
    /// `-m/--move`: apply folder moves and push them to the remote.
    pub move_mail: bool,
}

/// Execute the full sync workflow.
///
/// Strictly sequential; the first fatal step failure aborts the run with the
/// journal and terminal already updated by the runner. The remote-sync step
/// and backup retention are the only intentionally non-fatal steps.
pub fn run(
    cfg: &Config,
    notifier: &dyn Notifier,
    opts: RunOptions,
) -> Result<(), PipelineError> {
    let journal = Journal::open(&cfg.journal_path).map_err(|source| PipelineError::Io {
        path: cfg.journal_path.clone(),
        source,
    })?;
    log_soft(&journal, "run", &format!("start (notifier: {})", notifier.name()));

    let skip_maintenance = maintenance::skips_index_maintenance(std::env::consts::OS);

    prereq::check(&journal, !skip_maintenance)?;
    probe::check(&journal, cfg)?;
    maintenance::compact_and_verify(&journal, cfg, skip_maintenance)?;
    maintenance::backup(&journal, cfg)?;
    maintenance::prune_backups(&journal, cfg);

    let before = report::inbox_count(&journal);

    cycle::run(&journal, skip_maintenance)?;

    if opts.archive_deleted {
        archival::archive_deleted(&journal, cfg)?;
    }
    if opts.move_mail {
        archival::archive_moves(&journal)?;
    }

    let after = report::inbox_count(&journal);
    report::report(&journal, notifier, before, after);

    log_soft(&journal, "run", "complete");
    Ok(())
}

/// Journal write that must never fail the run.
pub(crate) fn log_soft(journal: &Journal, label: &str, detail: &str) {
    if let Err(err) = journal.append(label, detail) {
        log::warn!("journal write failed ({label}): {err}");
    }
}
