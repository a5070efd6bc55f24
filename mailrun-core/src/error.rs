//! Error types for mailrun-core.

use thiserror::Error;

/// All errors that can arise while building the startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `dirs::home_dir()` returned `None` — cannot derive the default maildir.
    #[error("cannot determine home directory; set $HOME or MAILRUN_MAILDIR")]
    HomeNotFound,

    /// A retention value that must be a positive whole number of days.
    #[error("invalid retention '{value}' for {variable}: must be a positive integer number of days")]
    InvalidRetention { variable: &'static str, value: String },
}
