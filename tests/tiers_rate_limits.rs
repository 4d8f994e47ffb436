mod common;

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{Method, StatusCode, header};
use coinpost::application::repos::{CreateRateLimitParams, RateLimitsRepo};
use coinpost::rate_limit::{RateLimitCounter, RateLimitError};
use serde_json::json;

use common::{TestApp, settings, test_app, test_app_with, test_app_with_backends};

async fn create_tier(app: &TestApp, admin: &str, name: &str) -> i64 {
    let response = app
        .request(
            Method::POST,
            "/api/v1/tier",
            Some(admin),
            Some(json!({ "name": name })),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body["id"].as_i64().expect("tier id")
}

#[tokio::test]
async fn tier_management_requires_superuser() {
    let app = test_app();
    let bob = app.signup("bob").await;
    let admin = app.superuser("admin").await;

    let forbidden = app
        .request(
            Method::POST,
            "/api/v1/tier",
            Some(&bob),
            Some(json!({ "name": "free" })),
        )
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    create_tier(&app, &admin, "free").await;
    let duplicate = app
        .request(
            Method::POST,
            "/api/v1/tier",
            Some(&admin),
            Some(json!({ "name": "free" })),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let renamed = app
        .request(
            Method::PATCH,
            "/api/v1/tier/free",
            Some(&admin),
            Some(json!({ "name": "basic" })),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.body["message"], "Tier updated");

    let tiers = app.get("/api/v1/tiers", None).await;
    assert_eq!(tiers.body["total_count"], 1);
    assert_eq!(tiers.body["data"][0]["name"], "basic");

    assert_eq!(
        app.get("/api/v1/tier/free", None).await.status,
        StatusCode::NOT_FOUND
    );

    let deleted = app
        .request(Method::DELETE, "/api/v1/tier/basic", Some(&admin), None)
        .await;
    assert_eq!(deleted.body["message"], "Tier deleted");
}

#[tokio::test]
async fn user_tier_assignment_is_visible() {
    let app = test_app();
    app.signup("bob").await;
    let admin = app.superuser("admin").await;
    let tier_id = create_tier(&app, &admin, "pro").await;

    let assigned = app
        .request(
            Method::PATCH,
            "/api/v1/user/bob/tier",
            Some(&admin),
            Some(json!({ "tier_id": tier_id })),
        )
        .await;
    assert_eq!(assigned.status, StatusCode::OK);
    assert_eq!(assigned.body["message"], "User Tier updated");

    let view = app.get("/api/v1/user/bob/tier", None).await;
    assert_eq!(view.status, StatusCode::OK);
    assert_eq!(view.body["username"], "bob");
    assert_eq!(view.body["tier"]["name"], "pro");

    let missing = app
        .request(
            Method::PATCH,
            "/api/v1/user/bob/tier",
            Some(&admin),
            Some(json!({ "tier_id": 9999 })),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rate_limit_rules_are_stored_sanitized() {
    let app = test_app();
    app.signup("bob").await;
    let admin = app.superuser("admin").await;
    let tier_id = create_tier(&app, &admin, "free").await;

    let created = app
        .request(
            Method::POST,
            "/api/v1/tier/free/rate_limit",
            Some(&admin),
            Some(json!({
                "name": "posts_read",
                "path": "/api/v1/bob/posts/",
                "limit": 5,
                "period": 3600,
            })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    assert_eq!(created.body["path"], "api_v1_bob_posts");
    assert_eq!(created.body["tier_id"], tier_id);
    let rule_id = created.body["id"].as_i64().unwrap();

    let duplicate = app
        .request(
            Method::POST,
            "/api/v1/tier/free/rate_limit",
            Some(&admin),
            Some(json!({ "name": "posts_read", "path": "x", "limit": 1, "period": 1 })),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let invalid = app
        .request(
            Method::POST,
            "/api/v1/tier/free/rate_limit",
            Some(&admin),
            Some(json!({ "name": "broken", "path": "x", "limit": 0, "period": 60 })),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::UNPROCESSABLE_ENTITY);

    let updated = app
        .request(
            Method::PATCH,
            &format!("/api/v1/tier/free/rate_limit/{rule_id}"),
            Some(&admin),
            Some(json!({ "limit": 10 })),
        )
        .await;
    assert_eq!(updated.body["message"], "Rate Limit updated");

    let listed = app.get("/api/v1/tier/free/rate_limits", None).await;
    assert_eq!(listed.body["data"][0]["limit"], 10);

    app.request(
        Method::PATCH,
        "/api/v1/user/bob/tier",
        Some(&admin),
        Some(json!({ "tier_id": tier_id })),
    )
    .await;
    let with_limits = app
        .get("/api/v1/user/bob/rate_limits", Some(&admin))
        .await;
    assert_eq!(with_limits.status, StatusCode::OK);
    assert_eq!(with_limits.body["tier_rate_limits"][0]["name"], "posts_read");

    let removed = app
        .request(
            Method::DELETE,
            &format!("/api/v1/tier/free/rate_limit/{rule_id}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(removed.body["message"], "Rate Limit deleted");
    assert_eq!(
        app.get(&format!("/api/v1/tier/free/rate_limit/{rule_id}"), None)
            .await
            .status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn user_rate_limits_list_every_tier_rule() {
    let app = test_app();
    app.signup("bob").await;
    let admin = app.superuser("admin").await;
    let tier_id = create_tier(&app, &admin, "busy").await;

    for n in 0..120 {
        app.repos
            .create_rate_limit(CreateRateLimitParams {
                tier_id,
                name: format!("rule_{n}"),
                path: format!("api_v1_route_{n}"),
                limit: 5,
                period: 60,
            })
            .await
            .expect("rule");
    }
    app.request(
        Method::PATCH,
        "/api/v1/user/bob/tier",
        Some(&admin),
        Some(json!({ "tier_id": tier_id })),
    )
    .await;

    let with_limits = app
        .get("/api/v1/user/bob/rate_limits", Some(&admin))
        .await;
    assert_eq!(with_limits.status, StatusCode::OK);
    let rules = with_limits.body["tier_rate_limits"].as_array().unwrap();
    assert_eq!(rules.len(), 120);
    assert_eq!(rules[119]["name"], "rule_119");
}

#[tokio::test]
async fn tier_rule_throttles_matching_path() {
    let app = test_app();
    let bob = app.signup("bob").await;
    let admin = app.superuser("admin").await;
    let tier_id = create_tier(&app, &admin, "free").await;

    app.request(
        Method::POST,
        "/api/v1/tier/free/rate_limit",
        Some(&admin),
        Some(json!({
            "name": "posts_read",
            "path": "api/v1/bob/posts",
            "limit": 1,
            "period": 3600,
        })),
    )
    .await;
    app.request(
        Method::PATCH,
        "/api/v1/user/bob/tier",
        Some(&admin),
        Some(json!({ "tier_id": tier_id })),
    )
    .await;

    let first = app.get("/api/v1/bob/posts", Some(&bob)).await;
    assert_eq!(first.status, StatusCode::OK);

    let second = app.get("/api/v1/bob/posts", Some(&bob)).await;
    assert_eq!(second.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(second.body["error"]["code"], "rate_limited");
    assert_eq!(second.body["error"]["message"], "Rate limit exceeded.");
    let retry_after: u64 = second.headers[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=3600).contains(&retry_after));

    // Other paths and other users keep their own counters.
    let admin_read = app.get("/api/v1/bob/posts", Some(&admin)).await;
    assert_eq!(admin_read.status, StatusCode::OK);
}

#[tokio::test]
async fn anonymous_callers_get_the_default_quota() {
    let mut settings = settings();
    settings.rate_limit.default_limit = NonZeroU32::new(2).unwrap();
    let app = test_app_with(settings);
    app.signup("bob").await;

    for _ in 0..2 {
        assert_eq!(
            app.get("/api/v1/bob/posts", None).await.status,
            StatusCode::OK
        );
    }
    let limited = app.get("/api/v1/bob/posts", None).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(app.counter.len(), 1);
}

/// Counter backend that is always down.
struct OfflineCounter;

#[async_trait]
impl RateLimitCounter for OfflineCounter {
    async fn incr(&self, _key: &str, _ttl: Duration) -> Result<u64, RateLimitError> {
        Err(RateLimitError::backend("connection refused"))
    }
}

#[tokio::test]
async fn requests_pass_when_the_counter_backend_is_down() {
    let mut settings = settings();
    settings.rate_limit.default_limit = NonZeroU32::new(1).unwrap();
    let app = test_app_with_backends(settings, None, Some(Arc::new(OfflineCounter)));
    let bob = app.signup("bob").await;

    for _ in 0..3 {
        assert_eq!(
            app.get("/api/v1/bob/posts", None).await.status,
            StatusCode::OK
        );
    }
    let created = app
        .request(
            Method::POST,
            "/api/v1/bob/post",
            Some(&bob),
            Some(json!({ "title": "Still up", "text": "Limiter offline." })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
}
