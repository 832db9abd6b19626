use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use serde_json::json;
use std::process::{Command, Output};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

use common::{commit_detail_json, commit_json, repo_json};

// Integration tests for the commitmark CLI
// These tests run the actual binary against a throwaway config and state database

/// Write a config pointing at `api_base` with its state database inside `temp_dir`
fn write_config(temp_dir: &TempDir, api_base: &str) -> std::path::PathBuf {
    let config = temp_dir.child("config.yml");
    let state_db = temp_dir.child("state.db");
    config
        .write_str(&format!(
            r#"
github:
  api_base: "{}"
  auth_method: "none"
  username: "octocat"
  per_page: 2
  timeout: 5
storage:
  state_db: "{}"
logging:
  level: "warn"
  color: false
"#,
            api_base,
            state_db.path().display()
        ))
        .unwrap();
    config.path().to_path_buf()
}

fn commitmark(temp_dir: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_commitmark"))
        .args(args)
        .env("XDG_CONFIG_HOME", temp_dir.path())
        .env("XDG_DATA_HOME", temp_dir.path())
        .env_remove("GITHUB_TOKEN")
        .env_remove("GITHUB_API_BASE")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute commitmark")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_cli_help() {
    let temp_dir = TempDir::new().unwrap();
    let output = commitmark(&temp_dir, &["--help"]);

    assert!(output.status.success());
    let text = stdout(&output);
    for command in ["repos", "commits", "show", "fav", "select", "config", "auth"] {
        assert!(text.contains(command), "help is missing '{}'", command);
    }
}

#[test]
fn test_cli_version() {
    let temp_dir = TempDir::new().unwrap();
    let output = commitmark(&temp_dir, &["--version"]);

    assert!(output.status.success());
    assert!(predicate::str::contains("commitmark").eval(&stdout(&output)));
}

#[test]
fn test_invalid_command() {
    let temp_dir = TempDir::new().unwrap();
    let output = commitmark(&temp_dir, &["frobnicate"]);

    assert!(!output.status.success());
}

#[test]
fn test_config_path_follows_xdg() {
    let temp_dir = TempDir::new().unwrap();
    let output = commitmark(&temp_dir, &["config", "path"]);

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("commitmark/config.yml"));
    assert!(text.contains(&temp_dir.path().display().to_string()));
}

#[test]
fn test_default_config_is_created() {
    let temp_dir = TempDir::new().unwrap();
    let output = commitmark(&temp_dir, &["config", "show"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("api_base"));
    temp_dir
        .child("commitmark/config.yml")
        .assert(predicate::path::exists());
}

#[test]
fn test_invalid_config_fails() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.child("broken.yml");
    config.write_str("github: [this is not a mapping").unwrap();

    let output = commitmark(
        &temp_dir,
        &["--config", config.path().to_str().unwrap(), "config", "show"],
    );

    assert!(!output.status.success());
}

#[test]
fn test_auth_status_without_credentials_fails() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.child("token-only.yml");
    config
        .write_str("github:\n  auth_method: \"token\"\nlogging:\n  level: \"warn\"\n  color: false\n")
        .unwrap();

    let output = commitmark(
        &temp_dir,
        &["--config", config.path().to_str().unwrap(), "auth", "status"],
    );

    assert!(!output.status.success());
    assert!(stdout(&output).contains("Authentication failed"));
}

#[test]
fn test_auth_status_anonymous_succeeds() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&temp_dir, "http://127.0.0.1:9");

    let output = commitmark(
        &temp_dir,
        &["--config", config.to_str().unwrap(), "auth", "status"],
    );

    assert!(output.status.success());
    assert!(stdout(&output).contains("Anonymous"));
}

#[test]
fn test_selections_persist_between_runs() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&temp_dir, "http://127.0.0.1:9");
    let config = config.to_str().unwrap();

    let set = commitmark(
        &temp_dir,
        &["--config", config, "select", "set", "panel", r#"{"open": true}"#],
    );
    assert!(set.status.success());

    let get = commitmark(&temp_dir, &["--config", config, "select", "get", "panel"]);
    assert!(get.status.success());
    assert!(stdout(&get).contains(r#""open":true"#));

    commitmark(&temp_dir, &["--config", config, "select", "clear"]);
    let missing = commitmark(&temp_dir, &["--config", config, "select", "get", "panel"]);
    assert!(!missing.status.success());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_repos_lists_names() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/octocat/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            repo_json(1, "octocat", "hello-world"),
            repo_json(2, "octocat", "spoon-knife"),
        ])))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&temp_dir, &server.uri());

    let output = commitmark(&temp_dir, &["--config", config.to_str().unwrap(), "repos"]);

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("octocat/hello-world"));
    assert!(text.contains("octocat/spoon-knife"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_error_exits_non_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/ghost/repos"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&temp_dir, &server.uri());

    let output = commitmark(
        &temp_dir,
        &["--config", config.to_str().unwrap(), "repos", "ghost"],
    );

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("User not found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_commits_listing_in_requested_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello-world/commits"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            commit_json("bbbbbbb222", "2024-01-02T00:00:00Z", "Second change"),
            commit_json("aaaaaaa111", "2024-01-01T00:00:00Z", "First change"),
        ])))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&temp_dir, &server.uri());

    let output = commitmark(
        &temp_dir,
        &[
            "--config",
            config.to_str().unwrap(),
            "commits",
            "--repo",
            "hello-world",
            "--order",
            "oldest",
        ],
    );

    assert!(output.status.success());
    let text = stdout(&output);
    let first = text.find("First change").unwrap();
    let second = text.find("Second change").unwrap();
    assert!(first < second);
    assert!(text.contains("--page 2"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_favorite_survives_between_runs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello-world/commits/abc1234567"))
        .respond_with(ResponseTemplate::new(200).set_body_json(commit_detail_json("abc1234567")))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&temp_dir, &server.uri());
    let config = config.to_str().unwrap();

    let add = commitmark(
        &temp_dir,
        &["--config", config, "fav", "add", "--repo", "hello-world", "abc1234567"],
    );
    assert!(add.status.success());
    assert!(stdout(&add).contains("Added abc1234"));

    let list = commitmark(&temp_dir, &["--config", config, "fav", "list"]);
    assert!(list.status.success());
    let text = stdout(&list);
    assert!(text.contains("Favorite commits (1)"));
    assert!(text.contains("hello-world"));
    assert!(text.contains("Fix the flux capacitor"));

    let remove = commitmark(&temp_dir, &["--config", config, "fav", "remove", "abc1234567"]);
    assert!(remove.status.success());

    let list = commitmark(&temp_dir, &["--config", config, "fav", "list"]);
    assert!(stdout(&list).contains("Favorite commits (0)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_show_prints_files() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello-world/commits/abc1234567"))
        .respond_with(ResponseTemplate::new(200).set_body_json(commit_detail_json("abc1234567")))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&temp_dir, &server.uri());

    let output = commitmark(
        &temp_dir,
        &[
            "--config",
            config.to_str().unwrap(),
            "show",
            "--repo",
            "hello-world",
            "abc1234567",
            "--patch",
        ],
    );

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("src/flux.rs"));
    assert!(text.contains("+3 -1"));
    assert!(text.contains("+new"));
}
