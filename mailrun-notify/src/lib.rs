//! User notification channel for mailrun.
//!
//! The best available channel is probed once at startup and reused for the
//! whole run: desktop notifications when a graphical session is detected,
//! a colored stderr line otherwise. Delivery is best-effort — a notifier
//! must never fail the run.

use colored::Colorize;

/// Something that can surface a short message to the user outside the
/// terminal's normal output flow.
pub trait Notifier {
    /// Deliver `body` under the short heading `summary`. Best-effort.
    fn notify(&self, summary: &str, body: &str);

    /// Channel name, for journaling which backend was selected.
    fn name(&self) -> &'static str;
}

/// Pick the best available channel for this session.
pub fn best_available() -> Box<dyn Notifier> {
    if desktop_session_available() {
        Box::new(DesktopNotifier)
    } else {
        Box::new(TerminalNotifier)
    }
}

/// Whether a desktop notification daemon is plausibly reachable.
///
/// macOS always has the notification center; elsewhere we require a
/// graphical session variable to avoid blocking on a dead D-Bus.
pub fn desktop_session_available() -> bool {
    if cfg!(target_os = "macos") {
        return true;
    }
    std::env::var_os("DISPLAY").is_some() || std::env::var_os("WAYLAND_DISPLAY").is_some()
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

/// Desktop notifications via the platform notification service.
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, summary: &str, body: &str) {
        let result = notify_rust::Notification::new()
            .summary(summary)
            .body(body)
            .icon("mail-message-new")
            .appname("mailrun")
            .show();
        if let Err(err) = result {
            log::warn!("desktop notification failed, falling back to stderr: {err}");
            TerminalNotifier.notify(summary, body);
        }
    }

    fn name(&self) -> &'static str {
        "desktop"
    }
}

/// Fallback channel: a highlighted line on stderr.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, summary: &str, body: &str) {
        eprintln!("{} {}", format!("[{summary}]").bold().cyan(), body);
    }

    fn name(&self) -> &'static str {
        "terminal"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
