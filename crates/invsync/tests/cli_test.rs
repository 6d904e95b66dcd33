#![allow(deprecated)] // Command::cargo_bin

use assert_cmd::Command;
use httpmock::Method::PATCH;
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

const RUN_FILE: &str = r#"
inventory "lab"
template "deploy-web"
timeout "5m"
vars { release "1.4.2" }
host "a.example.com" group="web"
host "b.example.com" group="web"
"#;

const AWX_VARS: [&str; 10] = [
    "AWX_URL",
    "TOWER_HOST",
    "AWX_TOKEN",
    "AWX_USERNAME",
    "AWX_PASSWORD",
    "AWX_ORGANIZATION",
    "AWX_VERIFY_SSL",
    "INVSYNC_POLL_INTERVAL",
    "INVSYNC_RUN_PATH",
    "INVSYNC_TIMEOUT",
];

/// `invsync` isolated from the user's configuration and environment
fn invsync(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("invsync").unwrap();
    for key in AWX_VARS {
        cmd.env_remove(key);
    }
    cmd.env("INVSYNC_CONFIG_DIR", config_dir.path())
        .env("NO_COLOR", "1")
        .current_dir(config_dir.path());
    cmd
}

fn project(run_file: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("run.kdl"), run_file).unwrap();
    dir
}

#[test]
fn test_cli_help() {
    let dir = tempfile::tempdir().unwrap();
    invsync(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("teardown"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_cli_version() {
    let dir = tempfile::tempdir().unwrap();
    invsync(&dir)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("invsync"));
}

#[test]
fn test_run_help() {
    let dir = tempfile::tempdir().unwrap();
    invsync(&dir)
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[FILE]"))
        .stdout(predicate::str::contains("--timeout"))
        .stdout(predicate::str::contains("--organization"));
}

#[test]
fn test_invalid_command() {
    let dir = tempfile::tempdir().unwrap();
    invsync(&dir).arg("invalid-command").assert().failure();
}

#[test]
fn test_validate_discovers_run_file() {
    let dir = project(RUN_FILE);
    invsync(&dir)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Run file is valid"))
        .stdout(predicate::str::contains("a.example.com"))
        .stdout(predicate::str::contains("deploy-web"));
}

#[test]
fn test_validate_rejects_duplicate_hosts() {
    let dir = project(&format!("{}\nhost \"a.example.com\"", RUN_FILE));
    invsync(&dir)
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("listed more than once"));
}

#[test]
fn test_validate_without_run_file() {
    let dir = tempfile::tempdir().unwrap();
    invsync(&dir)
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("run file not found"));
}

#[test]
fn test_run_without_url_fails() {
    let dir = project(RUN_FILE);
    invsync(&dir)
        .args(["run", "--yes"])
        .env("AWX_TOKEN", "t")
        .assert()
        .failure()
        .stderr(predicate::str::contains("AWX URL is not configured"));
}

#[test]
fn test_run_declined_makes_no_request() {
    let dir = project(RUN_FILE);
    invsync(&dir)
        .arg("run")
        .env("AWX_URL", "http://127.0.0.1:9")
        .env("AWX_TOKEN", "t")
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Aborted"));
}

#[test]
fn test_teardown_missing_inventory() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/v2/organizations/")
            .query_param("name", "Default");
        then.status(200)
            .json_body(json!({"next": null, "results": [{"id": 1, "name": "Default"}]}));
    });
    let list = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v2/inventories/")
            .query_param("name", "lab")
            .query_param("organization", "1");
        then.status(200)
            .json_body(json!({"count": 0, "next": null, "results": []}));
    });

    invsync(&dir)
        .args(["teardown", "lab", "--yes"])
        .env("AWX_URL", server.base_url())
        .env("AWX_TOKEN", "t")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to delete"));

    list.assert();
}

#[test]
fn test_teardown_in_other_organization() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/v2/organizations/")
            .query_param("name", "Ops");
        then.status(200)
            .json_body(json!({"next": null, "results": [{"id": 2, "name": "Ops"}]}));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/v2/inventories/")
            .query_param("name", "lab")
            .query_param("organization", "2");
        then.status(200)
            .json_body(json!({"next": null, "results": [{"id": 9, "name": "lab", "organization": 2}]}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/v2/inventories/9/hosts/");
        then.status(200).json_body(json!({"next": null, "results": []}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/v2/inventories/9/groups/");
        then.status(200).json_body(json!({"next": null, "results": []}));
    });
    let delete = server.mock(|when, then| {
        when.method(DELETE).path("/api/v2/inventories/9/");
        then.status(204);
    });

    invsync(&dir)
        .args(["teardown", "lab", "--organization", "Ops", "--yes"])
        .env("AWX_URL", server.base_url())
        .env("AWX_TOKEN", "t")
        .assert()
        .success()
        .stdout(predicate::str::contains("(Ops)"));

    delete.assert();
}

#[test]
fn test_run_end_to_end() {
    let dir = project(RUN_FILE);
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/api/v2/organizations/");
        then.status(200)
            .json_body(json!({"next": null, "results": [{"id": 1, "name": "Default"}]}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/v2/inventories/");
        then.status(200)
            .json_body(json!({"next": null, "results": [{"id": 5, "name": "lab", "organization": 1}]}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/v2/inventories/5/groups/");
        then.status(200)
            .json_body(json!({"next": null, "results": [{"id": 3, "name": "web", "inventory": 5}]}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/v2/inventories/5/hosts/");
        then.status(200).json_body(json!({
            "next": null,
            "results": [
                {"id": 10, "name": "a.example.com", "inventory": 5, "variables": ""},
                {"id": 11, "name": "b.example.com", "inventory": 5, "variables": ""}
            ]
        }));
    });
    let updates = server.mock(|when, then| {
        when.method(PATCH).path_contains("/api/v2/hosts/");
        then.status(200).json_body(json!({
            "id": 10, "name": "a.example.com", "inventory": 5, "variables": "{}"
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/v2/job_templates/");
        then.status(200)
            .json_body(json!({"next": null, "results": [{"id": 4, "name": "deploy-web"}]}));
    });
    let launch = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v2/job_templates/4/launch/")
            .json_body(json!({
                "inventory": 5,
                "limit": "a.example.com,b.example.com",
                "extra_vars": "{\"release\":\"1.4.2\"}"
            }));
        then.status(201)
            .json_body(json!({"id": 77, "job": 77, "status": "pending"}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/v2/jobs/77/");
        then.status(200)
            .json_body(json!({"id": 77, "status": "successful"}));
    });

    invsync(&dir)
        .args(["run", "--yes"])
        .env("AWX_URL", server.base_url())
        .env("AWX_TOKEN", "t")
        .assert()
        .success()
        .stdout(predicate::str::contains("Job 77 finished: successful"));

    updates.assert_hits(2);
    launch.assert();
}
