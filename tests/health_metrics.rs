mod common;

use std::collections::HashSet;
use std::num::NonZeroU32;

use axum::http::{Method, StatusCode};
use metrics_util::debugging::DebuggingRecorder;
use serde_json::json;
use serial_test::serial;

use common::{settings, test_app, test_app_with};

#[tokio::test]
#[serial]
async fn health_reports_database_status() {
    let app = test_app();

    let healthy = app.get("/api/v1/health", None).await;
    assert_eq!(healthy.status, StatusCode::OK);
    assert_eq!(healthy.body["name"], "coinpost");
    assert_eq!(healthy.body["database"], "ok");
    assert_eq!(healthy.body["version"], env!("CARGO_PKG_VERSION"));

    app.repos.set_database_down(true);
    let degraded = app.get("/api/v1/health", None).await;
    assert_eq!(degraded.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(degraded.body["database"], "unavailable");
}

#[tokio::test]
#[serial]
async fn cache_and_throttle_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let mut settings = settings();
    settings.rate_limit.default_limit = NonZeroU32::new(3).unwrap();
    let app = test_app_with(settings);
    let bob = app.signup("bob").await;

    let created = app
        .request(
            Method::POST,
            "/api/v1/bob/post",
            Some(&bob),
            Some(json!({ "title": "Metrics", "text": "Counting things." })),
        )
        .await;
    let id = created.body["id"].as_i64().unwrap();

    // miss, hit, then limited on the fourth call to the same path
    for _ in 0..3 {
        app.get("/api/v1/bob/posts", Some(&bob)).await;
    }
    app.request(
        Method::DELETE,
        &format!("/api/v1/bob/post/{id}"),
        Some(&bob),
        None,
    )
    .await;
    let limited = app.get("/api/v1/bob/posts", Some(&bob)).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    for metric in [
        "coinpost_cache_hit_total",
        "coinpost_cache_miss_total",
        "coinpost_cache_invalidated_keys_total",
        "coinpost_rate_limit_rejected_total",
    ] {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
