#![allow(clippy::unwrap_used)]
// Integration tests for `BackendClient` using wiremock.

use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use funrun_api::{BackendClient, Error, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, BackendClient) {
    let server = MockServer::start().await;
    let submit_url = Url::parse(&format!("{}/exec", server.uri())).unwrap();
    let stats_url = Url::parse(&format!("{}/stats/exec", server.uri())).unwrap();
    let client = BackendClient::with_client(reqwest::Client::new(), submit_url, stats_url);
    (server, client)
}

fn sample_record() -> serde_json::Value {
    json!({
        "studentName": "Juan Dela Cruz",
        "studentId": "2024-0001",
        "email": "juan@g.cjc.edu.ph",
        "college": "CCIS",
        "course": "BS Computer Science",
        "paymentAmount": 200,
        "paymentMethod": "Cash"
    })
}

// ── Submission tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_submit_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/exec"))
        .and(header("content-type", "application/json"))
        .and(body_json(sample_record()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Payment recorded successfully"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = client.submit(&sample_record()).await.unwrap();

    assert!(ack.confirmed);
    assert_eq!(ack.message.as_deref(), Some("Payment recorded successfully"));
}

#[tokio::test]
async fn test_submit_backend_refusal() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/exec"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "Error: Missing required fields: studentName, college, or paymentAmount"
        })))
        .mount(&server)
        .await;

    let result = client.submit(&json!({})).await;

    assert!(
        matches!(result, Err(Error::Backend { .. })),
        "expected Backend error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_submit_server_error_is_transient() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/exec"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let err = client.submit(&sample_record()).await.unwrap_err();

    assert!(
        matches!(err, Error::Http { status: 503, .. }),
        "expected HTTP 503, got: {err:?}"
    );
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_submit_forbidden_is_auth() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/exec"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let err = client.submit(&sample_record()).await.unwrap_err();

    assert!(err.is_auth());
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_submit_html_reply_is_unconfirmed_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/exec"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<HTML><HEAD><TITLE>Moved Temporarily</TITLE></HEAD></HTML>"),
        )
        .mount(&server)
        .await;

    let ack = client.submit(&sample_record()).await.unwrap();

    assert!(!ack.confirmed);
}

#[tokio::test]
async fn test_submit_connection_refused_is_transient() {
    let submit_url = Url::parse("http://127.0.0.1:9/exec").unwrap();
    let stats_url = submit_url.clone();
    let client = BackendClient::with_client(reqwest::Client::new(), submit_url, stats_url);

    let err = client.submit(&sample_record()).await.unwrap_err();

    assert!(matches!(err, Error::Transport(_)), "got: {err:?}");
    assert!(err.is_transient());
}

// ── Statistics tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_daily_stats() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/stats/exec"))
        .and(query_param("userEmail", "finance@g.cjc.edu.ph"))
        .and(query_param("date", "10/16/2026"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "todayPayments": 4,
            "todayAmount": 800,
            "totalPayments": 19,
            "totalAmount": 3800,
            "date": "10/16/2026"
        })))
        .mount(&server)
        .await;

    let stats = client
        .daily_stats("finance@g.cjc.edu.ph", Some("10/16/2026"))
        .await
        .unwrap();

    assert_eq!(stats.today_payments, 4);
    assert_eq!(stats.total_payments, 19);
    assert_eq!(stats.previous_payments(), 15);
    assert!((stats.total_amount - 3800.0).abs() < f64::EPSILON);
    assert_eq!(stats.date.as_deref(), Some("10/16/2026"));
}

#[tokio::test]
async fn test_daily_stats_error_field() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/stats/exec"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "error": "Required columns not found" })),
        )
        .mount(&server)
        .await;

    let result = client.daily_stats("finance@g.cjc.edu.ph", None).await;

    assert!(
        matches!(result, Err(Error::Backend { ref message }) if message == "Required columns not found"),
        "unexpected result: {result:?}"
    );
}

#[tokio::test]
async fn test_daily_stats_http_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/stats/exec"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let result = client.daily_stats("finance@g.cjc.edu.ph", None).await;

    assert!(matches!(result, Err(Error::Http { status: 500, .. })));
}

#[tokio::test]
async fn test_daily_stats_timeout_reports_request_budget() {
    let server = MockServer::start().await;
    let url = Url::parse(&format!("{}/stats/exec", server.uri())).unwrap();
    let transport = TransportConfig::default().with_timeout(Duration::from_secs(1));
    let client = BackendClient::new(url.clone(), url, &transport).unwrap();

    Mock::given(method("GET"))
        .and(path("/stats/exec"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "todayPayments": 0 }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = client
        .daily_stats("finance@g.cjc.edu.ph", None)
        .await
        .unwrap_err();

    assert!(
        matches!(err, Error::Timeout { timeout_secs: 1 }),
        "got: {err:?}"
    );
    assert!(err.is_timeout());
}
