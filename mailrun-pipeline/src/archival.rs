//! Flag-gated archival phases.
//!
//! Deletion archival (`-d`): move the backing files of messages tagged
//! `deleted` into the trash directory, reindex, prune old trash, expunge the
//! remote. Move archival (`-m`): apply afew's folder moves, patch up the
//! Archive folder's tags (a gap in afew's rule coverage), push the result.
//! Every step here is fatal on failure.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use mailrun_core::{config, Config, FailurePolicy, Journal, Step};

use crate::error::PipelineError;
use crate::log_soft;
use crate::maintenance::prune_old_files;
use crate::runner::{capture_step, run_sequence};

/// Archive deleted messages locally, then expunge them from the remote.
pub fn archive_deleted(journal: &Journal, cfg: &Config) -> Result<(), PipelineError> {
    // Retention is validated before anything is listed or moved, so a bad
    // value aborts the phase with every file untouched.
    let keep_days = config::parse_keep_days("MAILRUN_TRASH_KEEP_DAYS", &cfg.trash_keep_days)
        .map_err(|_| {
            let err = PipelineError::InvalidRetention {
                value: cfg.trash_keep_days.clone(),
            };
            log_soft(journal, "archive", &err.to_string());
            err
        })?;

    if !cfg.trash_dir.is_dir() {
        log_soft(
            journal,
            "archive",
            &format!("trash directory missing: {}", cfg.trash_dir.display()),
        );
        return Err(PipelineError::MissingDirectory {
            path: cfg.trash_dir.clone(),
        });
    }

    let listing = capture_step(
        journal,
        "list deleted mail",
        "notmuch",
        &["search", "--output=files", "--", "tag:deleted"],
    )?;
    let files = files_outside(&listing, &cfg.trash_dir);
    log_soft(
        journal,
        "archive",
        &format!("{} message file(s) to archive", files.len()),
    );

    let trash_for_move = cfg.trash_dir.clone();
    let trash_for_prune = cfg.trash_dir.clone();
    run_sequence(
        journal,
        vec![
            Step::func("archive deleted mail", FailurePolicy::Abort, move || {
                relocate(&files, &trash_for_move)
            }),
            Step::command(
                "reindex mail",
                "notmuch",
                &["new", "--quiet"],
                FailurePolicy::Abort,
            ),
            Step::func("prune archived mail", FailurePolicy::Abort, move || {
                prune_old_files(&trash_for_prune, keep_days, |_| true)
                    .map(|removed| format!("pruned {} file(s)", removed.len()))
                    .map_err(|err| err.to_string())
            }),
            Step::command(
                "expunge deleted mail",
                "mbsync",
                &["--all", "--expunge"],
                FailurePolicy::Abort,
            ),
        ],
    )
}

/// Apply folder moves and push the resulting state to the remote.
pub fn archive_moves(journal: &Journal) -> Result<(), PipelineError> {
    run_sequence(journal, move_steps())
}

/// Step table for move archival; every step is fatal.
pub fn move_steps() -> Vec<Step> {
    vec![
        Step::command("move mail", "afew", &["--move-mails"], FailurePolicy::Abort),
        // afew's rules miss mail that lands in Archive by hand; retag it.
        Step::command(
            "tag archived mail",
            "notmuch",
            &["tag", "+archived", "--", "folder:Archive and not tag:archived"],
            FailurePolicy::Abort,
        ),
        Step::command(
            "push archived mail",
            "mbsync",
            &["--all", "--push"],
            FailurePolicy::Abort,
        ),
    ]
}

/// Parse a `notmuch search --output=files` listing, keeping only paths not
/// already under `trash_dir`.
fn files_outside(listing: &str, trash_dir: &Path) -> Vec<PathBuf> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .filter(|path| !path.starts_with(trash_dir))
        .collect()
}

/// Move each file into `trash_dir`, renaming on name collisions.
fn relocate(files: &[PathBuf], trash_dir: &Path) -> Result<String, String> {
    let mut moved = 0usize;
    for file in files {
        let name = file
            .file_name()
            .ok_or_else(|| format!("not a file path: {}", file.display()))?;
        let mut dest = trash_dir.join(name);
        let mut attempt = 1u32;
        while dest.exists() {
            dest = trash_dir.join(format!("{}.{attempt}", name.to_string_lossy()));
            attempt += 1;
        }
        move_file(file, &dest)
            .map_err(|err| format!("failed to archive {}: {err}", file.display()))?;
        moved += 1;
    }
    Ok(format!("archived {moved} message file(s)"))
}

/// Rename, falling back to copy + remove across filesystems.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn config_in(tmp: &TempDir, keep_days: &str) -> Config {
        let mut cfg = Config::from_lookup(tmp.path(), |_| None).unwrap();
        cfg.trash_dir = tmp.path().join("trash");
        cfg.trash_keep_days = keep_days.to_string();
        cfg
    }

    fn journal_in(tmp: &TempDir) -> Journal {
        Journal::open(tmp.path().join("run.log")).unwrap()
    }

    #[test]
    fn non_numeric_retention_aborts_without_touching_files() {
        let tmp = TempDir::new().unwrap();
        let journal = journal_in(&tmp);
        let cfg = config_in(&tmp, "a fortnight");
        fs::create_dir_all(&cfg.trash_dir).unwrap();
        let kept = cfg.trash_dir.join("cur-message:2,T");
        fs::write(&kept, b"mail").unwrap();

        let err = archive_deleted(&journal, &cfg).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRetention { .. }));
        assert!(kept.exists(), "guard failure must not delete anything");
    }

    #[test]
    fn zero_retention_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let journal = journal_in(&tmp);
        let cfg = config_in(&tmp, "0");
        fs::create_dir_all(&cfg.trash_dir).unwrap();
        let err = archive_deleted(&journal, &cfg).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRetention { .. }));
    }

    #[test]
    fn missing_trash_dir_exits_two() {
        let tmp = TempDir::new().unwrap();
        let journal = journal_in(&tmp);
        let cfg = config_in(&tmp, "30");
        let err = archive_deleted(&journal, &cfg).unwrap_err();
        assert!(matches!(err, PipelineError::MissingDirectory { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn listing_filter_skips_files_already_in_trash() {
        let trash = Path::new("/mail/.trash");
        let listing = "/mail/inbox/cur/a:2,ST\n\n/mail/.trash/b:2,T\n  /mail/inbox/cur/c:2,T \n";
        let files = files_outside(listing, trash);
        assert_eq!(
            files,
            vec![
                PathBuf::from("/mail/inbox/cur/a:2,ST"),
                PathBuf::from("/mail/inbox/cur/c:2,T"),
            ]
        );
    }

    #[test]
    fn relocate_moves_files_and_handles_collisions() {
        let tmp = TempDir::new().unwrap();
        let trash = tmp.path().join("trash");
        fs::create_dir_all(&trash).unwrap();

        let src_dir = tmp.path().join("cur");
        fs::create_dir_all(&src_dir).unwrap();
        let first = src_dir.join("msg");
        fs::write(&first, b"one").unwrap();
        // Same basename already sits in the trash.
        fs::write(trash.join("msg"), b"existing").unwrap();

        let detail = relocate(&[first.clone()], &trash).unwrap();
        assert_eq!(detail, "archived 1 message file(s)");
        assert!(!first.exists());
        assert_eq!(fs::read(trash.join("msg.1")).unwrap(), b"one");
        assert_eq!(fs::read(trash.join("msg")).unwrap(), b"existing");
    }

    #[test]
    fn relocate_reports_the_failing_path() {
        let tmp = TempDir::new().unwrap();
        let trash = tmp.path().join("trash");
        fs::create_dir_all(&trash).unwrap();
        let ghost = tmp.path().join("cur").join("gone");
        let err = relocate(&[ghost.clone()], &trash).unwrap_err();
        assert!(err.contains("gone"));
    }

    #[test]
    fn move_archival_steps_are_all_fatal() {
        let steps = move_steps();
        assert_eq!(steps.len(), 3);
        assert!(steps.iter().all(|s| s.policy == FailurePolicy::Abort));
        assert_eq!(steps[0].label, "move mail");
        assert_eq!(steps[2].label, "push archived mail");
    }
}
