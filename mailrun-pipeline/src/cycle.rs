//! The tag / sync / tag cycle.
//!
//! Remote sync runs warn-only on purpose: partial success is better than
//! none, since some messages may already have transferred when mbsync
//! fails. Everything around it is fatal — a compact failure after indexing
//! means the index was corrupted by the previous step.

use mailrun_core::{FailurePolicy, Journal, Step};

use crate::error::PipelineError;
use crate::runner::run_sequence;

/// The ordered step table for one sync cycle.
///
/// `skip_compact` drops both compact steps (platform override).
pub fn steps(skip_compact: bool) -> Vec<Step> {
    let mut steps = vec![
        Step::command(
            "index new mail",
            "notmuch",
            &["new", "--quiet"],
            FailurePolicy::Abort,
        ),
        Step::command(
            "compact index",
            "notmuch",
            &["compact", "--quiet"],
            FailurePolicy::Abort,
        ),
        Step::command(
            "tag new mail",
            "afew",
            &["--tag", "--new"],
            FailurePolicy::Abort,
        ),
        Step::command("sync mailboxes", "mbsync", &["--all"], FailurePolicy::Warn),
        Step::command("index synced mail", "notmuch", &["new"], FailurePolicy::Abort),
        Step::command(
            "compact index",
            "notmuch",
            &["compact", "--quiet"],
            FailurePolicy::Abort,
        ),
        Step::command(
            "retag synced mail",
            "afew",
            &["--tag", "--new", "--verbose"],
            FailurePolicy::Abort,
        ),
    ];
    if skip_compact {
        steps.retain(|s| s.label != "compact index");
    }
    steps
}

/// Run the cycle under the standard policy loop.
pub fn run(journal: &Journal, skip_compact: bool) -> Result<(), PipelineError> {
    run_sequence(journal, steps(skip_compact))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_sync_is_the_only_non_fatal_step() {
        let steps = steps(false);
        assert_eq!(steps.len(), 7);
        for step in &steps {
            let expected = if step.label == "sync mailboxes" {
                FailurePolicy::Warn
            } else {
                FailurePolicy::Abort
            };
            assert_eq!(step.policy, expected, "policy for '{}'", step.label);
        }
    }

    #[test]
    fn platform_override_drops_both_compact_steps() {
        let steps = steps(true);
        assert_eq!(steps.len(), 5);
        assert!(steps.iter().all(|s| s.label != "compact index"));
    }

    #[test]
    fn tagging_runs_before_and_after_remote_sync() {
        let steps = steps(false);
        let labels: Vec<&str> = steps.iter().map(|s| s.label.as_str()).collect();
        let pre = labels.iter().position(|l| *l == "tag new mail").unwrap();
        let sync = labels.iter().position(|l| *l == "sync mailboxes").unwrap();
        let post = labels.iter().position(|l| *l == "retag synced mail").unwrap();
        assert!(pre < sync && sync < post);
    }
}
