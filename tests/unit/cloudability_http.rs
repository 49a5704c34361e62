//! Unit tests for CloudabilityClient against a local mock server

use chrono::NaiveDate;
use cloud_spend_extractor::fetcher::cloudability::{build_http_client, CloudabilityClient};
use cloud_spend_extractor::fetcher::{FailureKind, FetchError, SpendSource};
use cloud_spend_extractor::{DateWindow, VendorAccount, UNKNOWN_TAG};
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn account() -> VendorAccount {
    VendorAccount::new("123456789012", "prod")
}

fn client_for(server: &MockServer, timeout: Duration) -> CloudabilityClient {
    let http = build_http_client(timeout).unwrap();
    CloudabilityClient::new(http, &server.uri(), "token")
}

fn result_row(date: &str, resource: &str, owner: &str) -> serde_json::Value {
    json!({
        "resource_identifier": resource,
        "enhanced_service_name": "EC2 Instance",
        "tag1": "web-01",
        "tag8": "staging",
        "tag13": owner,
        "date": date,
        "unblended_cost": "$12.50",
        "adjusted_cost": "$11.00",
        "usage_hours": "24",
        "usage_quantity": "24"
    })
}

/// Fetch a single window and verify request shape and parsed records
#[tokio::test]
async fn test_fetch_window_sends_auth_and_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reporting/cost/run"))
        .and(query_param("auth_token", "token"))
        // "token:" in base64
        .and(header("authorization", "Basic dG9rZW46"))
        .and(query_param("start_date", "2024-01-01"))
        .and(query_param("end_date", "2024-01-01"))
        .and(query_param("filters", "vendor_account_identifier==123456789012"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                result_row("2024-01-01", "i-0abc", "ops@example.com"),
                result_row("2024-01-01", "i-0def", "(not set)"),
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let window = DateWindow::single_day(day("2024-01-01"));

    let records = client.fetch_window(&window, &account()).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].resource_id, "i-0abc");
    assert_eq!(records[0].owner_email, "ops@example.com");
    assert_eq!(records[0].application_env, "staging");
    assert_eq!(records[0].unblended_cost, Decimal::from_str("12.50").unwrap());
    assert_eq!(records[1].resource_id, "i-0def");
    assert_eq!(records[1].owner_email, UNKNOWN_TAG);
    assert!(records.iter().all(|r| r.date == day("2024-01-01")));
}

/// A multi-day window sends the last day as the inclusive end date
#[tokio::test]
async fn test_multi_day_window_end_date() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reporting/cost/run"))
        .and(query_param("start_date", "2024-01-01"))
        .and(query_param("end_date", "2024-01-07"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let window = DateWindow {
        start: day("2024-01-01"),
        end: day("2024-01-08"),
    };

    let records = client.fetch_window(&window, &account()).await.unwrap();
    assert!(records.is_empty());
}

async fn fetch_with_status(status: u16, body: &str) -> FetchError {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reporting/cost/run"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let window = DateWindow::single_day(day("2024-01-01"));
    client.fetch_window(&window, &account()).await.unwrap_err()
}

#[tokio::test]
async fn test_auth_failures_are_not_transient() {
    for status in [401, 403] {
        let err = fetch_with_status(status, "invalid token").await;
        assert!(!err.is_transient(), "HTTP {status} must not be retried");
        assert!(
            matches!(&err, FetchError::Auth { status: s, message } if *s == status && message == "invalid token"),
            "unexpected error for {status}: {err:?}"
        );
    }
}

#[tokio::test]
async fn test_server_errors_and_rate_limits_are_transient() {
    let err = fetch_with_status(500, "boom").await;
    assert_eq!(err.kind(), FailureKind::ServerError(500));
    assert!(err.is_transient());

    let err = fetch_with_status(502, "bad gateway").await;
    assert_eq!(err.kind(), FailureKind::ServerError(502));
    assert!(err.is_transient());

    let err = fetch_with_status(429, "slow down").await;
    assert_eq!(err.kind(), FailureKind::RateLimit);
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_unexpected_client_error_is_malformed() {
    let err = fetch_with_status(404, "no such report").await;
    assert!(matches!(err, FetchError::MalformedResponse(ref msg) if msg.contains("404")));
}

#[tokio::test]
async fn test_invalid_json_is_malformed() {
    let err = fetch_with_status(200, "<html>maintenance</html>").await;
    assert!(matches!(err, FetchError::MalformedResponse(ref msg) if msg.contains("invalid JSON")));
}

#[tokio::test]
async fn test_missing_results_is_malformed() {
    let err = fetch_with_status(200, r#"{"meta": {}}"#).await;
    assert!(matches!(err, FetchError::MalformedResponse(ref msg) if msg.contains("results")));
}

#[tokio::test]
async fn test_record_outside_window_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [result_row("2024-01-05", "i-0abc", "ops@example.com")]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let window = DateWindow::single_day(day("2024-01-01"));

    let err = client.fetch_window(&window, &account()).await.unwrap_err();
    assert!(matches!(err, FetchError::MalformedResponse(ref msg) if msg.contains("outside")));
}

#[tokio::test]
async fn test_slow_response_times_out_as_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "results": [] }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_millis(100));
    let window = DateWindow::single_day(day("2024-01-01"));

    let err = client.fetch_window(&window, &account()).await.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(err.kind(), FailureKind::NetworkTimeout);
}

#[tokio::test]
async fn test_connection_refused_is_transient_and_hides_token() {
    let http = build_http_client(Duration::from_secs(2)).unwrap();
    let client = CloudabilityClient::new(http, "http://127.0.0.1:1", "secret-token-value");
    let window = DateWindow::single_day(day("2024-01-01"));

    let err = client.fetch_window(&window, &account()).await.unwrap_err();
    assert!(err.is_transient(), "unexpected error: {err:?}");
    assert!(!err.to_string().contains("secret-token-value"), "token leaked: {err}");
}

/// A trailing slash on the base URL does not double up in the request path
#[tokio::test]
async fn test_base_url_trailing_slash() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reporting/cost/run"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let http = build_http_client(Duration::from_secs(5)).unwrap();
    let client = CloudabilityClient::new(http, &format!("{}/", server.uri()), "token");
    let window = DateWindow::single_day(day("2024-01-01"));

    assert!(client.fetch_window(&window, &account()).await.unwrap().is_empty());
}
