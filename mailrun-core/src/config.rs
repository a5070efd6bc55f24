//! Startup configuration for a mailrun invocation.
//!
//! Every tunable comes from an environment variable with a default; the
//! resulting [`Config`] is built once in `main` and passed by reference to
//! every pipeline phase. All path fields use `PathBuf`; never `String`.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Default reachability probe: TCP handshake against IMAPS with a 5s timeout.
pub const DEFAULT_PROBE: &str = "nc -z -w 5 imap.gmail.com 993";

/// Default retention, in days, for backups and archived deleted mail.
pub const DEFAULT_KEEP_DAYS: u32 = 30;

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root of the notmuch database (the maildir).
    pub maildir: PathBuf,
    /// Append-only run journal path.
    pub journal_path: PathBuf,
    /// Directory receiving timestamped index dumps.
    pub backup_dir: PathBuf,
    /// Backups strictly older than this many days are pruned.
    pub backup_keep_days: u32,
    /// Shell command probing mail-server reachability; `None` skips the probe.
    pub probe: Option<String>,
    /// Directory receiving the backing files of deleted messages.
    pub trash_dir: PathBuf,
    /// Raw `MAILRUN_TRASH_KEEP_DAYS` value. Validated by the deletion-archival
    /// phase so a bad value aborts that phase before any file is touched.
    pub trash_keep_days: String,
}

impl Config {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Self::from_lookup(&home, |key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Tests use this instead of mutating the process environment.
    pub fn from_lookup(
        home: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let maildir = lookup("MAILRUN_MAILDIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join("mail"));

        let journal_path = lookup("MAILRUN_LOG")
            .map(PathBuf::from)
            .unwrap_or_else(|| maildir.join(".mailrun.log"));

        let backup_dir = lookup("MAILRUN_BACKUP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| maildir.join(".backups"));

        let backup_keep_days = match lookup("MAILRUN_BACKUP_KEEP_DAYS") {
            Some(raw) => parse_keep_days("MAILRUN_BACKUP_KEEP_DAYS", &raw)?,
            None => DEFAULT_KEEP_DAYS,
        };

        // An explicitly empty probe disables the reachability check.
        let probe = match lookup("MAILRUN_PROBE") {
            Some(cmd) if cmd.trim().is_empty() => None,
            Some(cmd) => Some(cmd),
            None => Some(DEFAULT_PROBE.to_string()),
        };

        let trash_dir = lookup("MAILRUN_TRASH_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| maildir.join(".trash"));

        let trash_keep_days = lookup("MAILRUN_TRASH_KEEP_DAYS")
            .unwrap_or_else(|| DEFAULT_KEEP_DAYS.to_string());

        Ok(Config {
            maildir,
            journal_path,
            backup_dir,
            backup_keep_days,
            probe,
            trash_dir,
            trash_keep_days,
        })
    }

    /// Path of the xapian storage directory inside the notmuch database.
    pub fn xapian_dir(&self) -> PathBuf {
        self.maildir.join(".notmuch").join("xapian")
    }
}

/// Parse a retention value: a strictly positive integer number of days.
pub fn parse_keep_days(variable: &'static str, raw: &str) -> Result<u32, ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(days) if days > 0 => Ok(days),
        _ => Err(ConfigError::InvalidRetention {
            variable,
            value: raw.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
