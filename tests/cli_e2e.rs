//! End-to-end CLI tests for the arxiv-harvest binary.

// `Command::cargo_bin` is deprecated in assert_cmd >=2.0.17 in favor of
// `cargo::cargo_bin_cmd!` macro. Suppressed until migration to the new API.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EMPTY_FEED: &str = r#"<feed xmlns="http://www.w3.org/2005/Atom"></feed>"#;

/// Renders a feed whose entries link their PDFs under `server_uri`.
fn feed(server_uri: &str, entries: &[(&str, &str)]) -> String {
    let mut body = String::from(r#"<feed xmlns="http://www.w3.org/2005/Atom">"#);
    for (id, title) in entries {
        body.push_str(&format!(
            r#"<entry>
  <id>http://arxiv.org/abs/{id}</id>
  <title>{title}</title>
  <summary>Abstract of {id}.</summary>
  <link rel="related" type="application/pdf" href="{server_uri}/pdf/{id}"/>
</entry>"#
        ));
    }
    body.push_str("</feed>");
    body
}

/// Mounts a one-page corpus: `entries` at offset 0, exhausted afterwards.
async fn mount_single_page(server: &MockServer, entries: &[(&str, &str)]) {
    let page = feed(&server.uri(), entries);
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .and(query_param("start", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EMPTY_FEED))
        .mount(server)
        .await;
    for (id, _) in entries {
        Mock::given(method("GET"))
            .and(path(format!("/pdf/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 body"))
            .mount(server)
            .await;
    }
}

fn harvest_cmd(server: &MockServer, dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("arxiv-harvest").unwrap();
    cmd.arg("--query")
        .arg("machine unlearning")
        .arg("--dir")
        .arg(dir)
        .arg("--api-endpoint")
        .arg(format!("{}/api/query", server.uri()))
        .arg("--retry-delay")
        .arg("0")
        .arg("--page-delay")
        .arg("0");
    cmd
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("arxiv-harvest").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Batch download arXiv PDFs"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("arxiv-harvest").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("arxiv-harvest"));
}

/// Test that a missing --query causes non-zero exit with a clap error.
#[test]
fn test_binary_requires_query() {
    let mut cmd = Command::cargo_bin("arxiv-harvest").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--query"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    let mut cmd = Command::cargo_bin("arxiv-harvest").unwrap();
    cmd.arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

/// Test that an uncreatable download directory is fatal.
#[test]
fn test_binary_uncreatable_dir_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("blocker");
    std::fs::write(&blocker, b"a file, not a directory").unwrap();

    let mut cmd = Command::cargo_bin("arxiv-harvest").unwrap();
    cmd.arg("--query")
        .arg("q")
        .arg("--dir")
        .arg(blocker.join("downloads"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("download directory"));
}

/// Happy path: search, download, and record history on disk.
#[tokio::test(flavor = "multi_thread")]
async fn test_harvest_downloads_pdfs_and_writes_history() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_single_page(
        &server,
        &[
            ("2301.00001", "A: Study? (Part 1)"),
            ("2301.00002", "Another Paper"),
        ],
    )
    .await;

    harvest_cmd(&server, temp_dir.path()).assert().success();

    // Sanitized filenames, directly in the download directory.
    assert!(temp_dir.path().join("A Study Part 1.pdf").exists());
    assert!(temp_dir.path().join("Another Paper.pdf").exists());

    // History has the source-keyed shape with both identifiers.
    let raw = std::fs::read_to_string(temp_dir.path().join("history.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["arxiv"]["2301.00001"], "A: Study? (Part 1)");
    assert_eq!(value["arxiv"]["2301.00002"], "Another Paper");
}

/// Running the same query twice downloads nothing the second time.
#[tokio::test(flavor = "multi_thread")]
async fn test_second_run_is_idempotent() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_single_page(&server, &[("2301.00001", "Only Paper")]).await;

    harvest_cmd(&server, temp_dir.path()).assert().success();

    let pdf = temp_dir.path().join("Only Paper.pdf");
    let history = temp_dir.path().join("history.json");
    let history_before = std::fs::read(&history).unwrap();
    // Remove the PDF: a second run must not re-download it.
    std::fs::remove_file(&pdf).unwrap();

    harvest_cmd(&server, temp_dir.path()).assert().success();

    assert!(!pdf.exists(), "already-recorded item must not be re-fetched");
    assert_eq!(std::fs::read(&history).unwrap(), history_before);
}
