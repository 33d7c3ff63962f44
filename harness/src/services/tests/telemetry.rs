//! Tests for HttpTelemetrySink against a wiremock collector

use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::core::record::TelemetryRecord;
use crate::error::HarnessError;
use crate::services::HttpTelemetrySink;
use crate::traits::TelemetrySink;

fn sample_record() -> TelemetryRecord {
    let mut record = TelemetryRecord::new();
    record.insert("Site", "shop");
    record.insert("Exit Code", "0");
    record.insert("Stats.\nbar", "2");
    record
}

/// Test that rows are refused before the sink has been opened
#[tokio::test]
async fn test_append_before_open_is_rejected() {
    let sink = HttpTelemetrySink::new("http://127.0.0.1:9/rows");

    let err = sink.append_row(&sample_record()).await.unwrap_err();

    assert!(matches!(err, HarnessError::SinkNotOpen));
}

/// Test open followed by one appended row, with bearer authentication
#[tokio::test]
async fn test_open_and_append_posts_json_row() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rows"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rows"))
        .and(header("authorization", "Bearer s3cret"))
        .and(body_json(serde_json::json!({
            "Site": "shop",
            "Exit Code": "0",
            "Stats.\nbar": "2"
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let mut sink = HttpTelemetrySink::new(format!("{}/rows", server.uri())).with_token(Some("s3cret".to_string()));
    sink.open().await.unwrap();
    assert!(sink.is_open());

    sink.append_row(&sample_record()).await.unwrap();
}

/// Test that an unhealthy collector cannot be opened
#[tokio::test]
async fn test_open_fails_on_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut sink = HttpTelemetrySink::new(format!("{}/rows", server.uri()));
    let err = sink.open().await.unwrap_err();

    assert!(matches!(err, HarnessError::Infrastructure { .. }));
    assert!(!sink.is_open());
}

/// Test that a rejected row is an infrastructure error
#[tokio::test]
async fn test_append_fails_on_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut sink = HttpTelemetrySink::new(server.uri());
    sink.open().await.unwrap();
    let err = sink.append_row(&sample_record()).await.unwrap_err();

    assert_eq!(err.kind(), crate::error::ErrorKind::Infrastructure);
    assert!(err.to_string().contains("503"));
}
