//! Inbox delta report — the user-visible outcome of a run.

use colored::Colorize;

use mailrun_core::Journal;
use mailrun_notify::Notifier;

use crate::log_soft;
use crate::runner::capture_step;

/// Current inbox message count, or `None` when the query fails.
///
/// Counting is soft: a run whose sync work succeeded should not abort just
/// because the report cannot be computed.
pub fn inbox_count(journal: &Journal) -> Option<i64> {
    let stdout = match capture_step(journal, "count inbox", "notmuch", &["count", "tag:inbox"]) {
        Ok(stdout) => stdout,
        Err(err) => {
            log::warn!("inbox count unavailable: {err}");
            return None;
        }
    };
    match stdout.trim().parse::<i64>() {
        Ok(count) => Some(count),
        Err(_) => {
            log::warn!("unparseable notmuch count output: {:?}", stdout.trim());
            log_soft(journal, "count inbox", "unparseable output");
            None
        }
    }
}

/// Delta message for a notification, or `None` when nothing changed.
pub fn format_delta(before: i64, after: i64) -> Option<String> {
    let delta = after - before;
    match delta {
        0 => None,
        d if d > 0 => Some(format!(
            "{d} new messages (Inbox before: {before}, after: {after})"
        )),
        d => Some(format!(
            "{d} messages (Inbox before: {before}, after: {after})"
        )),
    }
}

/// Print or notify the inbox delta.
pub fn report(
    journal: &Journal,
    notifier: &dyn Notifier,
    before: Option<i64>,
    after: Option<i64>,
) {
    let (Some(before), Some(after)) = (before, after) else {
        eprintln!(
            "{} inbox count unavailable, delta not reported",
            "warning:".yellow().bold()
        );
        log_soft(journal, "report", "inbox count unavailable");
        return;
    };

    match format_delta(before, after) {
        None => {
            println!("No new mail");
            log_soft(journal, "report", "no new mail");
        }
        Some(message) => {
            notifier.notify("mailrun", &message);
            println!("{message}");
            log_soft(journal, "report", &message);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
