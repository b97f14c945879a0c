use assert_cmd::prelude::*;
use std::process::Command;

fn bin() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("kube-podtime"))
}

#[test]
fn dev_smoke_human_runs_and_exits_zero() {
    let mut cmd = bin();

    let assert = cmd
        .env("RUST_LOG", "off")
        .args(["--dev", "--dev-rate-ms", "1", "--no-color", "alpha", "beta"])
        .assert()
        .success();

    let out = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(out.contains("outcome=Succeeded"), "stdout was: {out}");
    assert!(out.contains("image_pull=unavailable"), "stdout was: {out}");
}

#[test]
fn dev_smoke_json_reports_every_workload_once() {
    let mut cmd = bin();

    let assert = cmd
        .env("RUST_LOG", "off")
        .args([
            "--dev",
            "--dev-rate-ms",
            "1",
            "--json",
            "--no-color",
            "alpha",
            "beta",
        ])
        .assert()
        .success();

    let out = String::from_utf8_lossy(&assert.get_output().stdout).to_string();

    let mut workloads = Vec::new();
    for line in out.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let v: serde_json::Value =
            serde_json::from_str(line).expect("each line must be valid JSON");
        for k in [
            "workload",
            "pod",
            "outcome",
            "scheduling_delay_ms",
            "image_pull",
            "container_start_delay_ms",
            "total_run_ms",
        ] {
            assert!(v.get(k).is_some(), "missing key {k} in {v}");
        }
        assert_eq!(v["outcome"], "Succeeded");
        // The dev scenario always passes through scheduled and running.
        assert!(v["scheduling_delay_ms"].is_u64(), "in {v}");
        assert!(v["total_run_ms"].is_u64(), "in {v}");
        workloads.push(v["workload"].as_str().unwrap().to_string());
    }

    // The terminal snapshot is delivered twice per pod; exactly one report
    // each must survive.
    workloads.sort();
    assert_eq!(workloads, ["alpha", "beta"]);
}

#[test]
fn dev_failed_workload_exits_nonzero() {
    let mut cmd = bin();

    let assert = cmd
        .env("RUST_LOG", "off")
        .args([
            "--dev",
            "--dev-rate-ms",
            "1",
            "--json",
            "--no-color",
            "--dev-fail",
            "beta",
            "alpha",
            "beta",
        ])
        .assert()
        .failure();

    let out = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let outcomes: Vec<(String, String)> = out
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            let v: serde_json::Value = serde_json::from_str(l).unwrap();
            (
                v["workload"].as_str().unwrap().to_string(),
                v["outcome"].as_str().unwrap().to_string(),
            )
        })
        .collect();

    assert!(outcomes.contains(&("alpha".into(), "Succeeded".into())));
    assert!(outcomes.contains(&("beta".into(), "Failed".into())));
}

#[test]
fn dev_create_failure_aborts_batch_with_no_tracking() {
    let mut cmd = bin();

    let assert = cmd
        .env("RUST_LOG", "off")
        .args([
            "--dev",
            "--dev-rate-ms",
            "1",
            "--json",
            "--no-color",
            "--dev-fail-create",
            "beta",
            "alpha",
            "beta",
        ])
        .assert()
        .failure();

    // Creation failed before tracking started: no reports at all.
    let out = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(out.trim().is_empty(), "expected no reports, got: {out}");
}
