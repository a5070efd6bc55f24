//! Index maintenance, backup, and backup retention.
//!
//! Compact and integrity-check the notmuch index, dump it to a timestamped
//! gzip artifact, atomically repoint the `latest.gz` alias, and prune old
//! artifacts. Corruption gets a dedicated recovery runbook because the
//! remediation (restore from backup) differs from every other failure.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};
use colored::Colorize;

use mailrun_core::{Config, FailurePolicy, Journal, Step};

use crate::error::{io_err, PipelineError};
use crate::log_soft;
use crate::runner::{run_sequence, run_step};

/// File-name prefix of every backup artifact.
pub const BACKUP_PREFIX: &str = "notmuch-";

/// Name of the alias pointing at the newest artifact.
pub const LATEST_ALIAS: &str = "latest.gz";

/// Whether this platform skips compaction and integrity checking entirely.
///
/// notmuch compact and xapian-check misbehave against the same database
/// build on macOS, so both are skipped there and the skip is journaled.
pub fn skips_index_maintenance(os: &str) -> bool {
    os == "macos"
}

/// Compact the index and scan it for corruption. Both fatal on failure.
pub fn compact_and_verify(
    journal: &Journal,
    cfg: &Config,
    skip: bool,
) -> Result<(), PipelineError> {
    if skip {
        log_soft(
            journal,
            "maintenance",
            "compact and integrity check skipped on this platform",
        );
        println!("compact/integrity check — skipped on this platform");
        return Ok(());
    }

    run_sequence(
        journal,
        vec![Step::command(
            "compact index",
            "notmuch",
            &["compact", "--quiet"],
            FailurePolicy::Abort,
        )],
    )?;

    let xapian_dir = cfg.xapian_dir();
    let outcome = run_step(
        journal,
        Step::command(
            "verify index",
            "xapian-check",
            &[&xapian_dir.to_string_lossy()],
            FailurePolicy::Abort,
        ),
    );
    if outcome.success() {
        Ok(())
    } else {
        Err(PipelineError::IndexCorrupt {
            detail: outcome.output,
        })
    }
}

/// Restore instructions shown only for detected index corruption.
pub fn recovery_runbook(cfg: &Config) -> String {
    let maildir = cfg.maildir.display();
    let latest = cfg.backup_dir.join(LATEST_ALIAS);
    format!(
        "{}\n\
         The notmuch index failed its integrity check. Do not sync.\n\
         Recover from the last good backup:\n\
         \x20 1. mv {maildir}/.notmuch {maildir}/.notmuch.corrupt\n\
         \x20 2. notmuch new\n\
         \x20 3. gunzip -c {} | notmuch restore\n\
         \x20 4. re-run mailrun\n\
         Delete {maildir}/.notmuch.corrupt once mail looks right.",
        "INDEX CORRUPTION DETECTED".red().bold(),
        latest.display(),
    )
}

/// Dump the index into a fresh timestamped artifact and repoint `latest.gz`.
///
/// Fatal on any failure: no sync proceeds without a fresh backup. A missing
/// backup directory is the one condition that exits 2 instead of 1.
pub fn backup(journal: &Journal, cfg: &Config) -> Result<PathBuf, PipelineError> {
    if !cfg.backup_dir.is_dir() {
        log_soft(
            journal,
            "backup",
            &format!("backup directory missing: {}", cfg.backup_dir.display()),
        );
        return Err(PipelineError::MissingDirectory {
            path: cfg.backup_dir.clone(),
        });
    }

    let artifact = cfg.backup_dir.join(backup_file_name(Local::now()));
    let output_arg = format!("--output={}", artifact.display());
    run_sequence(
        journal,
        vec![Step::command(
            "back up index",
            "notmuch",
            &["dump", "--gzip", &output_arg],
            FailurePolicy::Abort,
        )],
    )?;

    point_latest_alias(&cfg.backup_dir, &artifact)?;
    log_soft(
        journal,
        "backup",
        &format!("wrote {}", artifact.display()),
    );
    Ok(artifact)
}

/// Artifact name for a dump taken at `now`: `notmuch-YYYYmmdd-HHMMSS.gz`.
pub fn backup_file_name(now: DateTime<Local>) -> String {
    format!("{BACKUP_PREFIX}{}.gz", now.format("%Y%m%d-%H%M%S"))
}

/// Atomically repoint `latest.gz` at `artifact`.
///
/// The alias is a relative symlink created under a temporary name and
/// renamed over the old one, so a reader never sees a missing alias.
fn point_latest_alias(backup_dir: &Path, artifact: &Path) -> Result<(), PipelineError> {
    let link = backup_dir.join(LATEST_ALIAS);
    let target = artifact
        .file_name()
        .ok_or_else(|| io_err(artifact, io::Error::other("artifact has no file name")))?;

    let tmp = backup_dir.join(format!("{LATEST_ALIAS}.tmp"));
    let _ = fs::remove_file(&tmp);
    make_alias(Path::new(target), &tmp).map_err(|e| io_err(&tmp, e))?;
    fs::rename(&tmp, &link).map_err(|e| io_err(&link, e))?;
    Ok(())
}

#[cfg(unix)]
fn make_alias(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn make_alias(target: &Path, link: &Path) -> io::Result<()> {
    // No symlinks; copy the artifact under the alias name instead.
    let dir = link.parent().unwrap_or_else(|| Path::new("."));
    fs::copy(dir.join(target), link).map(|_| ())
}

/// Prune backup artifacts strictly older than the retention window.
///
/// Best-effort by contract: failures are journaled and warned, never fatal.
/// The `latest.gz` alias is never a candidate.
pub fn prune_backups(journal: &Journal, cfg: &Config) {
    let removed = prune_old_files(&cfg.backup_dir, cfg.backup_keep_days, |name| {
        name.starts_with(BACKUP_PREFIX) && name.ends_with(".gz")
    });
    match removed {
        Ok(paths) => {
            log_soft(
                journal,
                "retention",
                &format!("pruned {} backup(s)", paths.len()),
            );
        }
        Err(err) => {
            eprintln!(
                "{} backup pruning failed: {err}",
                "warning:".yellow().bold()
            );
            log_soft(journal, "retention", &format!("pruning failed: {err}"));
        }
    }
}

/// Delete regular files in `dir` whose name matches and whose modification
/// time is strictly older than `keep_days` days. Returns the deleted paths.
///
/// Shared by backup retention (best-effort) and trash pruning (fatal); the
/// caller owns the failure policy.
pub fn prune_old_files(
    dir: &Path,
    keep_days: u32,
    matches: impl Fn(&str) -> bool,
) -> io::Result<Vec<PathBuf>> {
    let cutoff = SystemTime::now() - Duration::from_secs(u64::from(keep_days) * 86_400);
    let mut removed = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !matches(name) {
            continue;
        }
        // Symlinks (the latest alias) are never pruned, whatever their name.
        let meta = fs::symlink_metadata(&path)?;
        if !meta.is_file() {
            continue;
        }
        if meta.modified()? < cutoff {
            fs::remove_file(&path)?;
            removed.push(path);
        }
    }
    Ok(removed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use filetime::{set_file_mtime, FileTime};
    use tempfile::TempDir;

    use super::*;

    fn age_file(path: &Path, days: u64) {
        let then = SystemTime::now() - Duration::from_secs(days * 86_400);
        set_file_mtime(path, FileTime::from_system_time(then)).unwrap();
    }

    #[test]
    fn macos_skips_maintenance_other_platforms_do_not() {
        assert!(skips_index_maintenance("macos"));
        assert!(!skips_index_maintenance("linux"));
        assert!(!skips_index_maintenance("freebsd"));
    }

    #[test]
    fn skipped_maintenance_is_journaled_not_attempted() {
        let tmp = TempDir::new().unwrap();
        let journal = Journal::open(tmp.path().join("run.log")).unwrap();
        let cfg = Config::from_lookup(tmp.path(), |_| None).unwrap();
        // Would fail hard if notmuch/xapian-check were invoked here.
        compact_and_verify(&journal, &cfg, true).unwrap();
        let log = std::fs::read_to_string(journal.path()).unwrap();
        assert!(log.contains("skipped on this platform"));
    }

    #[test]
    fn backup_file_names_sort_chronologically() {
        use chrono::TimeZone;
        let earlier = Local.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        let later = Local.with_ymd_and_hms(2026, 3, 1, 9, 30, 1).unwrap();
        let a = backup_file_name(earlier);
        let b = backup_file_name(later);
        assert_eq!(a, "notmuch-20260301-093000.gz");
        assert!(a < b);
    }

    #[test]
    fn missing_backup_dir_is_a_missing_directory_error() {
        let tmp = TempDir::new().unwrap();
        let journal = Journal::open(tmp.path().join("run.log")).unwrap();
        let mut cfg = Config::from_lookup(tmp.path(), |_| None).unwrap();
        cfg.backup_dir = tmp.path().join("does-not-exist");
        let err = backup(&journal, &cfg).unwrap_err();
        assert!(matches!(err, PipelineError::MissingDirectory { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn prune_deletes_only_strictly_older_artifacts() {
        let tmp = TempDir::new().unwrap();
        let old = tmp.path().join("notmuch-20260101-000000.gz");
        let fresh = tmp.path().join("notmuch-20260830-000000.gz");
        let unrelated = tmp.path().join("notes.txt");
        for p in [&old, &fresh, &unrelated] {
            fs::write(p, b"dump").unwrap();
        }
        age_file(&old, 31);
        age_file(&unrelated, 31);

        let removed = prune_old_files(tmp.path(), 30, |name| {
            name.starts_with(BACKUP_PREFIX) && name.ends_with(".gz")
        })
        .unwrap();

        assert_eq!(removed, vec![old.clone()]);
        assert!(!old.exists());
        assert!(fresh.exists());
        assert!(unrelated.exists(), "non-matching files are never pruned");
    }

    #[test]
    fn exactly_at_threshold_is_retained() {
        let tmp = TempDir::new().unwrap();
        let edge = tmp.path().join("notmuch-20260801-000000.gz");
        fs::write(&edge, b"dump").unwrap();
        // A hair under 30 days old: strictly-older means it survives.
        let then = SystemTime::now() - Duration::from_secs(30 * 86_400 - 60);
        set_file_mtime(&edge, FileTime::from_system_time(then)).unwrap();

        let removed = prune_old_files(tmp.path(), 30, |name| name.ends_with(".gz")).unwrap();
        assert!(removed.is_empty());
        assert!(edge.exists());
    }

    #[cfg(unix)]
    #[test]
    fn latest_alias_survives_pruning_of_its_target_window() {
        let tmp = TempDir::new().unwrap();
        let kept = tmp.path().join("notmuch-20260830-000000.gz");
        fs::write(&kept, b"dump").unwrap();
        let link = tmp.path().join(LATEST_ALIAS);
        std::os::unix::fs::symlink("notmuch-20260830-000000.gz", &link).unwrap();

        let removed = prune_old_files(tmp.path(), 30, |name| {
            (name.starts_with(BACKUP_PREFIX) && name.ends_with(".gz")) || name == LATEST_ALIAS
        })
        .unwrap();

        assert!(removed.is_empty());
        assert!(link.exists(), "latest alias must never be pruned");
        assert!(kept.exists());
    }

    #[cfg(unix)]
    #[test]
    fn latest_alias_repoints_atomically() {
        let tmp = TempDir::new().unwrap();
        let first = tmp.path().join("notmuch-20260830-000000.gz");
        let second = tmp.path().join("notmuch-20260830-000001.gz");
        fs::write(&first, b"one").unwrap();
        fs::write(&second, b"two").unwrap();

        point_latest_alias(tmp.path(), &first).unwrap();
        point_latest_alias(tmp.path(), &second).unwrap();

        let link = tmp.path().join(LATEST_ALIAS);
        let target = fs::read_link(&link).unwrap();
        assert_eq!(target, Path::new("notmuch-20260830-000001.gz"));
        assert!(!tmp.path().join(format!("{LATEST_ALIAS}.tmp")).exists());
    }

    #[test]
    fn runbook_names_the_latest_backup() {
        let cfg = Config::from_lookup(Path::new("/home/alice"), |_| None).unwrap();
        let runbook = recovery_runbook(&cfg);
        assert!(runbook.contains("notmuch restore"));
        assert!(runbook.contains("latest.gz"));
    }
}
