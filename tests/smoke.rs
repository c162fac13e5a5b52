//! Smoke tests -- verify the binary runs and key subcommands exist.

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("incident-synth").unwrap();
    // Keep a developer's local config from leaking into the tests.
    cmd.env_remove("INCIDENT_SYNTH_CONFIG");
    cmd
}

#[test]
fn test_cli_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("synthetic incident generator"));
}

#[test]
fn test_cli_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains("incident-synth"));
}

#[test]
fn test_subcommands_exist() {
    for sub in ["generate", "preview", "migrate", "summary"] {
        cmd().args([sub, "--help"]).assert().success();
    }
}

#[test]
fn test_preview_lists_anomalies() {
    let dir = tempfile::tempdir().unwrap();
    cmd()
        .current_dir(dir.path())
        .args([
            "preview",
            "--entity",
            "CRM",
            "--start",
            "2024-01-01",
            "--end",
            "2024-12-31",
            "--seed",
            "7",
            "--anomalies-only",
        ])
        .assert()
        .success()
        .stdout(predicates::str::contains("day(s) listed for CRM"));
}

#[test]
fn test_generate_rejects_inverted_window() {
    let dir = tempfile::tempdir().unwrap();
    cmd()
        .current_dir(dir.path())
        .args(["generate", "--dry-run", "--start", "2024-02-01", "--end", "2024-01-01"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("run window is inverted"));
}

#[test]
fn test_generate_without_schema_fails() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("store.db");
    cmd()
        .current_dir(dir.path())
        .args(["generate", "--start", "2024-01-01", "--end", "2024-01-03", "--db"])
        .arg(&db)
        .assert()
        .failure()
        .stderr(predicates::str::contains("no incidents schema"));
}

#[test]
fn test_migrate_generate_summary() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("store.db");

    cmd()
        .current_dir(dir.path())
        .arg("migrate")
        .arg("--db")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicates::str::contains("Schema ready"));

    cmd()
        .current_dir(dir.path())
        .args([
            "generate",
            "--entity",
            "CRM",
            "--entity",
            "ERP",
            "--start",
            "2024-01-01",
            "--end",
            "2024-01-31",
            "--seed",
            "1",
            "--json",
            "--db",
        ])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicates::str::contains("\"status\": \"complete\""))
        .stdout(predicates::str::contains("SUSTAINED_INCREASE"));

    cmd()
        .current_dir(dir.path())
        .arg("summary")
        .arg("--db")
        .arg(&db)
        .assert()
        .success()
        .stdout(predicates::str::contains("CRM"))
        .stdout(predicates::str::contains("ERP"))
        .stdout(predicates::str::contains("NORMAL"));
}

#[test]
fn test_broken_local_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("incident-synth.toml"),
        "[run]\nentities = [\"ONLY\"]\nstart_date = \"2024-13-45\"\n",
    )
    .unwrap();
    cmd()
        .current_dir(dir.path())
        .args(["generate", "--dry-run", "--end", "2022-01-03", "--json"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("failed to parse config file"))
        .stdout(predicates::str::contains("PRODUCT_A").not());
}

#[test]
fn test_broken_env_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[run\n").unwrap();
    cmd()
        .current_dir(dir.path())
        .env("INCIDENT_SYNTH_CONFIG", &path)
        .args(["generate", "--dry-run", "--end", "2022-01-03"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("failed to parse config file"));
}

#[test]
fn test_preview_matches_generate_for_each_entity() {
    let dir = tempfile::tempdir().unwrap();
    let window = ["--start", "2024-01-01", "--end", "2024-12-31", "--seed", "1"];

    let output = cmd()
        .current_dir(dir.path())
        .args(["generate", "--dry-run", "--json", "--entity", "CRM", "--entity", "ERP"])
        .args(window)
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let records = |entity: &str| {
        report
            .as_array()
            .unwrap()
            .iter()
            .find(|e| e["entity"] == entity)
            .unwrap()["records"]
            .as_u64()
            .unwrap()
    };
    assert_ne!(records("CRM"), records("ERP"));

    for entity in ["CRM", "ERP"] {
        cmd()
            .current_dir(dir.path())
            .args(["preview", "--entity", entity])
            .args(window)
            .assert()
            .success()
            .stdout(predicates::str::contains(format!(
                "366 day(s) listed for {}, {} record(s)",
                entity,
                records(entity)
            )));
    }

    // Several entities in one preview each get their own section.
    cmd()
        .current_dir(dir.path())
        .args(["preview", "--entity", "CRM", "--entity", "ERP"])
        .args(window)
        .assert()
        .success()
        .stdout(predicates::str::contains(format!("listed for ERP, {} record(s)", records("ERP"))));
}
