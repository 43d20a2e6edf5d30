use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::path::{Path, PathBuf};

fn scenario(id: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../fixtures/scenarios")
        .join(id)
        .join("codebase")
}

fn project_with(codebase: &Path) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("kwa");
    cmd.arg("-C").arg(dir.path()).arg("init").arg("--codebase").arg(codebase);
    cmd.assert().success().stdout(predicate::str::contains("kwa.toml"));
    dir
}

#[test]
fn check_clean_file_exits_zero() {
    let mut cmd = cargo_bin_cmd!("kwa");
    cmd.arg("check").arg(scenario("SC-01-clean").join("events.html"));
    cmd.assert().code(0).stdout(predicate::str::contains("[clean]"));
}

#[test]
fn check_file_with_error_exits_one() {
    let mut cmd = cargo_bin_cmd!("kwa");
    cmd.arg("check").arg(scenario("SC-02-missing-bottom-marker").join("events.html"));
    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("[error]").and(predicate::str::contains("bottom")));
}

#[test]
fn check_json_emits_one_record_per_line() {
    let dir = scenario("SC-06-rules-only-directory");
    let mut cmd = cargo_bin_cmd!("kwa");
    cmd.arg("check").arg("--json").arg(dir.join("a.html")).arg(dir.join("b.html"));
    let out = cmd.assert().code(0).get_output().stdout.clone();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<serde_json::Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1]["rollup"], "warning");
    assert_eq!(lines[1]["findings"][0]["code"], "DUPLICATE_MODIFIER");
}

#[test]
fn broken_rules_file_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let rules = dir.path().join("rules.yaml");
    std::fs::write(&rules, "script:\n  forbid_globals: ['(unclosed']\nrequired_markers: { top: [a] }\n").unwrap();
    let mut cmd = cargo_bin_cmd!("kwa");
    cmd.arg("check").arg("--rules").arg(&rules).arg(scenario("SC-01-clean").join("events.html"));
    cmd.assert().code(2).stderr(predicate::str::contains("error:"));
}

#[test]
fn audit_writes_reports_and_exits_by_worst_rollup() {
    let project = project_with(&scenario("SC-07-unreadable-input"));
    let mut cmd = cargo_bin_cmd!("kwa");
    cmd.arg("-C").arg(project.path()).arg("audit");
    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("2 files, worst rollup error"));

    let reports = project.path().join("reports");
    let run_dirs: Vec<_> = std::fs::read_dir(&reports).unwrap().collect();
    assert_eq!(run_dirs.len(), 1);
    let run_dir = run_dirs[0].as_ref().unwrap().path();
    let findings = std::fs::read_to_string(run_dir.join("findings.jsonl")).unwrap();
    assert_eq!(findings.lines().count(), 2);
    let summary = std::fs::read_to_string(run_dir.join("summary.md")).unwrap();
    assert!(summary.contains("UNREADABLE_FILE"));
}

#[test]
fn audit_clean_codebase_exits_zero() {
    let project = project_with(&scenario("SC-01-clean"));
    let mut cmd = cargo_bin_cmd!("kwa");
    cmd.arg("-C").arg(project.path()).arg("audit").arg("--rules-only");
    cmd.assert().code(0).stdout(predicate::str::contains("worst rollup clean"));
}

#[test]
fn audit_without_config_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("kwa");
    cmd.arg("-C").arg(dir.path()).arg("audit");
    cmd.assert().code(2);
}

#[test]
fn doctor_prints_fingerprint() {
    let project = project_with(&scenario("SC-06-rules-only-directory"));
    let mut cmd = cargo_bin_cmd!("kwa");
    cmd.arg("-C").arg(project.path()).arg("doctor");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("rules fingerprint:").and(predicate::str::contains("4 template files")));
}

#[test]
fn rules_default_prints_embedded_document() {
    let mut cmd = cargo_bin_cmd!("kwa");
    cmd.arg("rules").arg("--default");
    cmd.assert().success().stdout(predicate::str::contains("required_markers"));
}

#[test]
fn rules_summary_shows_match_mode() {
    let mut cmd = cargo_bin_cmd!("kwa");
    cmd.arg("rules");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("keyword match mode: prefix").and(predicate::str::contains("prefix %asset_")));
}
