#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::fs;
use std::os::unix::fs::symlink;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_trackcheck"))
}

fn init_repo() -> Result<TempDir, Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    fs::create_dir_all(temp.path().join(".git"))?;
    fs::create_dir_all(temp.path().join("docs"))?;
    fs::write(temp.path().join("README.md"), "[setup](docs/setup.md)\n")?;
    fs::write(
        temp.path().join("docs/setup.md"),
        "[home](/README.md) [site](https://example.com) [top](#setup)\n",
    )?;
    Ok(temp)
}

#[test]
fn full_scan_of_clean_repository_succeeds() -> Result<(), Box<dyn std::error::Error>> {
    let temp = init_repo()?;

    let mut cmd = cli();
    cmd.current_dir(temp.path()).arg("links");

    cmd.assert().success().code(0).stdout(predicate::str::is_empty());
    Ok(())
}

#[test]
fn explicit_file_with_missing_link_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = init_repo()?;
    fs::write(temp.path().join("docs/notes.md"), "[x](./missing.md)\n")?;

    let mut cmd = cli();
    cmd.current_dir(temp.path())
        .args(["links", "docs/notes.md", "README.md"]);

    cmd.assert()
        .failure()
        .code(1)
        .stdout(contains("docs/notes.md: Broken link: ./missing.md -> "))
        .stdout(contains("README.md").not());
    Ok(())
}

#[test]
fn full_scan_reports_every_broken_document() -> Result<(), Box<dyn std::error::Error>> {
    let temp = init_repo()?;
    fs::write(temp.path().join("a.md"), "[x](gone.md)\n")?;
    fs::write(temp.path().join("docs/b.md"), "[y](../nowhere.md)\n")?;
    symlink("a.md", temp.path().join("alias.md"))?;

    let mut cmd = cli();
    cmd.current_dir(temp.path()).arg("links");

    let output = cmd.assert().failure().code(1).get_output().stdout.clone();
    let stdout = String::from_utf8(output)?;
    assert_eq!(stdout.lines().count(), 2, "{stdout}");
    assert!(stdout.contains("a.md: Broken link: gone.md"));
    assert!(stdout.contains("docs/b.md: Broken link: ../nowhere.md"));
    Ok(())
}

#[test]
fn examples_directories_are_skipped() -> Result<(), Box<dyn std::error::Error>> {
    let temp = init_repo()?;
    let examples = temp.path().join("projects/demo/examples");
    fs::create_dir_all(&examples)?;
    fs::write(examples.join("sample.md"), "[illustrative](./not-real.md)\n")?;

    let mut cmd = cli();
    cmd.current_dir(temp.path()).arg("links");

    cmd.assert().success();
    Ok(())
}

#[test]
fn json_output_carries_structured_errors() -> Result<(), Box<dyn std::error::Error>> {
    let temp = init_repo()?;
    fs::write(temp.path().join("a.md"), "[x](gone.md)\n")?;

    let mut cmd = cli();
    cmd.current_dir(temp.path()).args(["--json", "links", "a.md"]);

    let output = cmd.assert().failure().code(1).get_output().stdout.clone();
    let value: serde_json::Value = serde_json::from_slice(&output)?;
    assert_eq!(value["type"], "links");
    assert_eq!(value["report"]["status"], "failure");
    assert_eq!(value["report"]["errors"][0]["kind"], "broken_link");
    assert_eq!(value["report"]["errors"][0]["target"], "gone.md");
    Ok(())
}

#[test]
fn unreadable_file_argument_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
    let temp = init_repo()?;

    let mut cmd = cli();
    cmd.current_dir(temp.path()).args(["links", "does-not-exist.md"]);

    cmd.assert()
        .failure()
        .code(71)
        .stderr(contains("does-not-exist.md"));
    Ok(())
}

#[test]
fn full_scan_continues_past_unreadable_document() -> Result<(), Box<dyn std::error::Error>> {
    let temp = init_repo()?;
    fs::write(temp.path().join("a.md"), "[x](gone.md)\n")?;
    fs::write(temp.path().join("b.md"), [0xff, 0xfe, 0x00, 0x9f])?;

    let mut cmd = cli();
    cmd.current_dir(temp.path()).arg("links");

    cmd.assert()
        .failure()
        .code(1)
        .stdout(contains("a.md: Broken link: gone.md -> "))
        .stdout(contains("b.md: Resolution error: b.md: "));
    Ok(())
}

#[test]
fn full_scan_of_missing_start_is_io_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = init_repo()?;

    let mut cmd = cli();
    cmd.current_dir(temp.path())
        .args(["--repo", "does-not-exist", "links"]);

    cmd.assert().failure().code(71).stdout(predicate::str::is_empty());
    Ok(())
}
