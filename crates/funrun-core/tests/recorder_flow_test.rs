#![allow(clippy::unwrap_used)]

// End-to-end recorder flow against a mock backend.

use std::time::Duration;

use funrun_api::BackendClient;
use funrun_core::{
    CoreError, PaymentForm, PaymentRecorder, RecorderConfig, StaffIdentity, SubmitPolicy,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn staff() -> StaffIdentity {
    StaffIdentity {
        name: "Finance Office".into(),
        email: "finance@g.cjc.edu.ph".into(),
        google_id: "109876543210".into(),
        picture: None,
    }
}

fn form() -> PaymentForm {
    PaymentForm {
        student_name: "Juan Dela Cruz".into(),
        student_id: "2024-00123".into(),
        email: "juan@g.cjc.edu.ph".into(),
        college: "CCIS".into(),
        course: "BS Computer Science".into(),
    }
}

fn recorder(server: &MockServer) -> PaymentRecorder {
    let url: url::Url = format!("{}/macros/s/deploy/exec", server.uri()).parse().unwrap();
    let mut config = RecorderConfig::new(url.clone(), url.clone());
    config.submit = SubmitPolicy {
        max_attempts: 3,
        backoff_step: Duration::from_millis(10),
        timeout: Duration::from_secs(5),
    };
    let client = BackendClient::with_client(reqwest::Client::new(), url.clone(), url);
    PaymentRecorder::new(client, &config)
}

#[tokio::test]
async fn record_posts_camel_case_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/macros/s/deploy/exec"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(serde_json::json!({
            "studentName": "Juan Dela Cruz",
            "studentId": "2024-00123",
            "college": "CCIS",
            "paymentAmount": 200,
            "paymentMethod": "Cash",
            "receivedBy": "Finance Office (finance@g.cjc.edu.ph)",
            "receiverEmail": "finance@g.cjc.edu.ph",
            "receiverGoogleId": "109876543210"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "message": "Payment recorded successfully"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = recorder(&server).record(&form(), &staff()).await.unwrap();
    assert_eq!(outcome.receipt.attempts, 1);
    assert!(outcome.receipt.ack.confirmed);
    assert!(outcome.record.timestamp.ends_with('Z'));
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = recorder(&server).record(&form(), &staff()).await.unwrap();
    assert_eq!(outcome.receipt.attempts, 3);
}

#[tokio::test]
async fn backend_refusal_is_final() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": false,
            "error": "Error: Missing required fields: studentName, college, or paymentAmount"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = recorder(&server).record(&form(), &staff()).await.unwrap_err();
    assert!(matches!(err, CoreError::Rejected { .. }), "got {err:?}");
    assert!(err.user_message().contains("Missing required fields"));
}

#[tokio::test]
async fn invalid_form_never_reaches_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut bad = form();
    bad.email = "juan@gmail.com".into();
    let err = recorder(&server).record(&bad, &staff()).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert_eq!(
        err.user_message(),
        "Please enter a valid email address ending in @g.cjc.edu.ph"
    );
}
