//! Tests for the cloud-spend-extractor binary: exit codes and output

use assert_cmd::Command;
use cloud_spend_extractor::fetcher::FailureKind;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn extractor() -> Command {
    let mut cmd = Command::cargo_bin("cloud-spend-extractor").unwrap();
    cmd.env_clear().env("RUST_LOG", "cloud_spend_extractor=debug");
    cmd
}

#[test]
fn test_help_lists_env_configuration() {
    extractor()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("CLOUDABILITY_AUTH_TOKEN"))
        .stdout(predicate::str::contains("END_BOUNDARY"));
}

#[test]
fn test_missing_token_fails() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("spend.csv");

    extractor()
        .args(["--vendor-account-id", "123456789012"])
        .arg("--output-file")
        .arg(&output)
        .assert()
        .failure();

    assert!(!output.exists());
}

#[test]
fn test_blank_token_is_configuration_error() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("spend.csv");

    extractor()
        .env("CLOUDABILITY_AUTH_TOKEN", "  ")
        .env("VENDOR_ACCOUNT_ID", "123456789012")
        .env("OUTPUT_FILE", &output)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("configuration"));

    assert!(!output.exists());
}

#[test]
fn test_malformed_start_date_fails_before_any_request() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("spend.csv");

    extractor()
        .args([
            "--auth-token",
            "token",
            "--vendor-account-id",
            "123456789012",
            "--start-date",
            "01/02/2024",
            // Unroutable; a request attempt would surface as a network error
            "--base-url",
            "http://127.0.0.1:1",
        ])
        .arg("--output-file")
        .arg(&output)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("start date"));

    assert!(!output.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_successful_run_writes_csv() {
    let server = MockServer::start().await;
    for (date, resource) in [("2024-01-01", "i-0abc"), ("2024-01-02", "i-0def")] {
        Mock::given(method("GET"))
            .and(path("/reporting/cost/run"))
            .and(query_param("auth_token", "token"))
            .and(query_param("start_date", date))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{
                    "resource_identifier": resource,
                    "enhanced_service_name": "S3",
                    "tag1": "bucket",
                    "tag8": "(not set)",
                    "tag13": "data@example.com",
                    "date": date,
                    "unblended_cost": "$1,000.25",
                    "adjusted_cost": "$900.00",
                    "usage_hours": "0",
                    "usage_quantity": "512"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out").join("spend.csv");
    let mut cmd = extractor();
    cmd.env("CLOUDABILITY_AUTH_TOKEN", "token")
        .env("VENDOR_ACCOUNT_ID", "123456789012")
        .env("VENDOR_ACCOUNT_NAME", "data-lake")
        .env("CLOUDABILITY_BASE_URL", server.uri())
        .args(["--start-date", "2024-01-01", "--end-boundary", "2024-01-02"])
        .arg("--output-file")
        .arg(&output);

    let assert = tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap();
    assert.success();

    let contents = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(
        lines,
        vec![
            "vendor_id,vendor_name,resource_id,service_name,name,owner_email,date,unblended_cost,adjusted_cost,usage_hours,usage_quantity,application_env",
            "123456789012,data-lake,i-0abc,S3,bucket,data@example.com,2024-01-01,1000.25,900.00,0,512,(unknown)",
            "123456789012,data-lake,i-0def,S3,bucket,data@example.com,2024-01-02,1000.25,900.00,0,512,(unknown)",
        ]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_auth_failure_exits_nonzero_without_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("spend.csv");
    let mut cmd = extractor();
    cmd.args([
        "--auth-token",
        "wrong",
        "--vendor-account-id",
        "123456789012",
        "--start-date",
        "2024-01-01",
        "--end-boundary",
        "2024-01-03",
        "--retry-interval",
        "0",
    ])
    .arg("--base-url")
    .arg(server.uri())
    .arg("--output-file")
    .arg(&output);

    let assert = tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap();
    assert.code(1).stdout(predicate::str::contains("auth"));

    assert!(!output.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_json_log_format_reports_failure_kind_and_suggestion() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("spend.csv");
    let mut cmd = extractor();
    cmd.env("LOG_FORMAT", "json")
        .args([
            "--auth-token",
            "rejected-token-7f3a",
            "--vendor-account-id",
            "123456789012",
            "--start-date",
            "2024-01-01",
            "--end-boundary",
            "2024-01-01",
        ])
        .arg("--base-url")
        .arg(server.uri())
        .arg("--output-file")
        .arg(&output);

    let assert = tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap()
        .code(1);

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let events: Vec<Value> = stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).unwrap_or_else(|e| panic!("not JSON ({e}): {line}"))
        })
        .collect();
    assert!(!events.is_empty());

    let fields = |event: &Value| event.get("fields").cloned().unwrap_or(Value::Null);
    assert!(
        events
            .iter()
            .any(|e| e["level"] == "ERROR" && fields(e)["kind"] == "auth"),
        "no error event with kind=auth: {stdout}"
    );

    let suggestion = format!("Suggestion: {}", FailureKind::AuthFailed(401).suggestion());
    assert!(
        events
            .iter()
            .any(|e| fields(e)["message"] == suggestion.as_str()),
        "no suggestion line: {stdout}"
    );
    assert!(!stdout.contains("rejected-token-7f3a"), "token leaked into logs");
    assert!(!output.exists());
}
