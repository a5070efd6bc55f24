//! Mailrun core library — configuration, step descriptors, journal, errors.
//!
//! Public API surface:
//! - [`config`] — env-derived [`Config`] built once at startup
//! - [`step`] — step descriptors and failure policies
//! - [`journal`] — append-only tab-separated run log
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod journal;
pub mod step;

pub use config::Config;
pub use error::ConfigError;
pub use journal::Journal;
pub use step::{FailurePolicy, Step, StepAction, StepOutcome};
