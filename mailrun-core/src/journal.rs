//! Append-only run journal.
//!
//! One row per event: `timestamp \t label \t detail`, local time, flat file.
//! The journal is evidence, not control flow — writes return `io::Result`
//! and callers treat failures as non-fatal.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

/// Handle to the tab-separated run log.
#[derive(Debug, Clone)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    /// Open (or create) the journal at `path`, creating parent directories.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Touch the file so a failed run still leaves a journal behind.
        OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Journal { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one `timestamp \t label \t detail` row.
    ///
    /// Tabs and newlines inside `label`/`detail` are flattened to spaces so
    /// every row stays a single three-column record.
    pub fn append(&self, label: &str, detail: &str) -> io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        writeln!(
            file,
            "{}\t{}\t{}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            flatten(label),
            flatten(detail),
        )
    }

    /// Append a multi-line blob (captured step output) as one row per line.
    pub fn append_block(&self, label: &str, text: &str) -> io::Result<()> {
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            self.append(label, line)?;
        }
        Ok(())
    }
}

fn flatten(field: &str) -> String {
    field.replace(['\t', '\n', '\r'], " ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
