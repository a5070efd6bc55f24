//! Error types for mailrun-pipeline.

use std::path::PathBuf;

use thiserror::Error;

use mailrun_core::ConfigError;

/// All fatal conditions a pipeline run can end in.
///
/// Every variant maps to a process exit code via [`PipelineError::exit_code`]:
/// missing backup/archive directories exit 2, everything else exits 1.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required external executable is not on the search path.
    #[error("required tool '{tool}' not found on PATH")]
    ToolMissing { tool: String },

    /// The reachability probe failed — the mail host is unreachable.
    #[error("mail host unreachable (probe `{probe}` exited {code})")]
    Unreachable { probe: String, code: i32 },

    /// A step with abort policy exited nonzero.
    #[error("step '{label}' failed with exit code {code}")]
    StepFailed { label: String, code: i32 },

    /// The index integrity check reported corruption. Recovery needs the
    /// restore-from-backup runbook, not a retry.
    #[error("index integrity check failed — the notmuch database looks corrupt")]
    IndexCorrupt { detail: String },

    /// A directory the backup/archival phases require does not exist.
    #[error("required directory missing: {path}")]
    MissingDirectory { path: PathBuf },

    /// The deletion-archival retention value is not a positive integer.
    #[error("invalid deleted-mail retention '{value}': must be a positive integer number of days")]
    InvalidRetention { value: String },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A startup configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PipelineError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::MissingDirectory { .. } => 2,
            _ => 1,
        }
    }
}

/// Convenience constructor for [`PipelineError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> PipelineError {
    PipelineError::Io {
        path: path.into(),
        source,
    }
}
