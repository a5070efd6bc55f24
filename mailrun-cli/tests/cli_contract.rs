//! CLI surface contract: flags, usage errors, and fail-fast behavior.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn mailrun() -> Command {
    Command::cargo_bin("mailrun").expect("mailrun binary")
}

/// A command wired to a scratch home with no tools on the PATH.
fn bare_mailrun(home: &TempDir) -> Command {
    let mut cmd = mailrun();
    cmd.env_clear()
        .env("HOME", home.path())
        .env("PATH", home.path().join("empty-bin"))
        .env("MAILRUN_MAILDIR", home.path().join("mail"))
        .env("MAILRUN_PROBE", "");
    cmd
}

#[test]
fn unknown_flag_exits_one() {
    mailrun()
        .arg("--bogus")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--bogus"));
}

#[test]
fn unexpected_positional_exits_one() {
    mailrun().arg("inbox").assert().code(1);
}

#[test]
fn help_documents_both_phase_flags_and_exits_zero() {
    mailrun()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--move").and(predicate::str::contains("--delete")));
}

#[test]
fn version_exits_zero() {
    mailrun().arg("--version").assert().success();
}

#[test]
fn missing_tool_aborts_before_any_mutation() {
    let home = TempDir::new().expect("home");
    std::fs::create_dir_all(home.path().join("empty-bin")).expect("mkdir");
    let maildir = home.path().join("mail");
    std::fs::create_dir_all(&maildir).expect("mkdir");
    let backups = maildir.join(".backups");
    std::fs::create_dir_all(&backups).expect("mkdir");

    bare_mailrun(&home)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("notmuch"));

    // No backup artifact, no alias: nothing stateful ran.
    let leftovers: Vec<_> = std::fs::read_dir(&backups)
        .expect("read backups")
        .collect();
    assert!(leftovers.is_empty(), "prereq failure must not touch backups");
}
