//! End-to-end tests for the buddy binary.
//!
//! Every test gets its own config file and JSON database in a temp dir.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        Self::with_extra("")
    }

    fn with_extra(extra: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let database = dir.path().join("db.json");
        let config = dir.path().join("buddy.toml");
        std::fs::write(
            &config,
            format!(
                "[database]\npath = {:?}\n{extra}",
                database.display().to_string()
            ),
        )
        .unwrap();
        Self { dir, config }
    }

    fn command(&self, format: &str) -> Command {
        let mut cmd = Command::cargo_bin("buddy").unwrap();
        cmd.env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .arg("--config")
            .arg(&self.config)
            .args(["--output-format", format]);
        cmd
    }

    fn buddy(&self) -> Command {
        self.command("plain")
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let out = self.command("json").args(args).output().unwrap();
        assert!(out.status.success(), "{:?}", out);
        serde_json::from_slice(&out.stdout).unwrap()
    }

    fn create(&self, email: &str, name: Option<&str>) {
        let mut cmd = self.buddy();
        cmd.args(["create", "--set", &format!("email={email}"), "--set", "password=hunter2"]);
        if let Some(name) = name {
            cmd.args(["--set", &format!("name={name}")]);
        }
        cmd.assert().success();
    }
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("buddy")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("query"))
        .stdout(predicate::str::contains("explain"));
}

#[test]
fn version_flag() {
    Command::cargo_bin("buddy")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn create_then_find_hides_password() {
    let ws = Workspace::new();
    ws.create("ada@example.com", Some("Ada"));

    ws.buddy()
        .args(["find", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("email=ada@example.com"))
        .stdout(predicate::str::contains("hunter2").not())
        .stdout(predicate::str::contains("password").not());

    let found = ws.json(&["find", "1"]);
    assert_eq!(found["id"], 1);
    assert_eq!(found["name"], "Ada");
    assert!(found.get("password").is_none());
    assert!(ws.dir.path().join("db.json").exists());
}

#[test]
fn find_missing_exits_with_not_found() {
    let ws = Workspace::new();
    ws.buddy()
        .args(["find", "42"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("User 42 not found"));
}

#[test]
fn query_null_matches_only_missing_names() {
    let ws = Workspace::new();
    ws.create("named@example.com", Some("Named"));
    ws.create("anon@example.com", None);

    let rows = ws.json(&["query", "--null", "name"]);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["email"], "anon@example.com");
    assert!(rows[0]["name"].is_null());
}

#[test]
fn query_count() {
    let ws = Workspace::new();
    ws.create("a@example.com", None);
    ws.create("b@example.com", None);

    ws.buddy()
        .args(["query", "--count"])
        .assert()
        .success()
        .stdout("2\n");
}

#[test]
fn duplicate_email_is_user_error() {
    let ws = Workspace::new();
    ws.create("ada@example.com", None);

    ws.buddy()
        .args(["create", "--set", "email=ada@example.com", "--set", "password=x"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unique"));
}

#[test]
fn unknown_column_is_user_error() {
    let ws = Workspace::new();
    ws.buddy()
        .args(["query", "--where", "nickname=ada"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("nickname"));
}

#[test]
fn update_and_remove_round_trip() {
    let ws = Workspace::new();
    ws.create("ada@example.com", None);

    let updated = ws.json(&["update", "1", "--set", "name=Ada"]);
    assert_eq!(updated["name"], "Ada");

    ws.buddy().args(["remove", "1"]).assert().success();
    ws.buddy().args(["remove", "1"]).assert().code(3);
    ws.buddy().args(["update", "1", "--set", "name=Again"]).assert().code(3);
}

#[test]
fn all_reports_paging_and_cursor() {
    let ws = Workspace::new();
    for n in 0..3 {
        ws.create(&format!("user{n}@example.com"), None);
    }

    let page = ws.json(&["all", "--limit", "2"]);
    assert_eq!(page["data"].as_array().unwrap().len(), 2);
    assert_eq!(page["paging"]["total_records"], 3);
    assert_eq!(page["paging"]["total_pages"], 2);
    assert_eq!(page["paging"]["page"], 1);
    assert_eq!(page["next_cursor"], 3);

    let last = ws.json(&["all", "--limit", "2", "--page", "2"]);
    assert_eq!(last["data"].as_array().unwrap().len(), 1);
    assert!(last["next_cursor"].is_null());
}

#[test]
fn all_on_empty_table_is_one_page() {
    let ws = Workspace::new();
    let page = ws.json(&["all"]);
    assert_eq!(page["paging"]["total_pages"], 1);
    assert_eq!(page["paging"]["total_records"], 0);
}

#[test]
fn explain_renders_is_null() {
    let ws = Workspace::new();
    ws.buddy()
        .args(["explain", "--null", "name", "--dialect", "postgres"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\" IS NULL"));
}

#[test]
fn explain_uses_configured_dialect() {
    let ws = Workspace::with_extra("dialect = \"mysql\"\n");
    ws.buddy()
        .args(["explain", "--where", "email=a@b.c"])
        .assert()
        .success()
        .stdout(predicate::str::contains("`email` = ?"));
}

#[test]
fn unknown_model_is_user_error() {
    let ws = Workspace::new();
    ws.buddy()
        .args(["--model", "Invoice", "all"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invoice"));
}

#[test]
fn models_lists_builtin_and_loaded() {
    let ws = Workspace::new();
    let models_dir = ws.dir.path().join("models");
    std::fs::create_dir(&models_dir).unwrap();
    std::fs::write(
        models_dir.join("post.toml"),
        "name = \"Post\"\ntable = \"posts\"\n\n[attributes.title]\ntype = \"text\"\n",
    )
    .unwrap();

    ws.buddy()
        .env("BUDDY_MODELS__PATH", &models_dir)
        .arg("models")
        .assert()
        .success()
        .stdout(predicate::str::contains("User (users)"))
        .stdout(predicate::str::contains("Post (posts)"));
}

#[test]
fn env_overrides_config_file() {
    let ws = Workspace::new();
    ws.buddy()
        .env("BUDDY_PAGINATION__DEFAULT_LIMIT", "3")
        .args(["config", "get", "pagination.default_limit"])
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn missing_config_file_is_config_error() {
    Command::cargo_bin("buddy")
        .unwrap()
        .args(["--config", "/definitely/not/here.toml", "models"])
        .assert()
        .code(4);
}

#[test]
fn init_writes_loadable_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("buddy.toml");

    Command::cargo_bin("buddy")
        .unwrap()
        .env("NO_COLOR", "1")
        .args(["--config"])
        .arg(&path)
        .arg("init")
        .assert()
        .success();

    assert!(path.exists());
    Command::cargo_bin("buddy")
        .unwrap()
        .arg("--config")
        .arg(&path)
        .args(["config", "get", "database.dialect"])
        .assert()
        .success()
        .stdout("sqlite\n");
}

#[test]
fn completions_generate_for_bash() {
    Command::cargo_bin("buddy")
        .unwrap()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("buddy"));
}
